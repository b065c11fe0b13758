#![allow(clippy::result_large_err)]

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vaccine_ledger::{
    SupplyChain,
    config::settings::load_settings,
    core::identity::{Role, StaticIdentity},
    errors::{Error, Result},
};

/// Command line front-end of the vaccine supply-chain ledger
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML settings file
    #[arg(long, global = true, default_value = "vaccine_ledger.toml")]
    config: PathBuf,

    /// Identity of the caller
    #[arg(long, global = true)]
    caller: Option<String>,

    /// Role claim carried by the caller, e.g. MANUFACTURER
    #[arg(long, global = true)]
    role: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Onboard a supply-chain administrator (super-administrator only)
    RegisterAdmin {
        /// Party JSON
        body: String,
    },
    /// Onboard a manufacturer, distributor or chemist
    RegisterParty {
        /// Party JSON
        body: String,
    },
    /// Suspend or reinstate a party
    SetActive {
        /// `{"id":..,"docType":..,"active":..}`
        body: String,
    },
    /// Show the caller's profile
    ViewProfile,
    /// Edit the caller's contact fields
    UpdateProfile {
        /// Partial party JSON with the contact fields to change
        body: String,
    },
    /// Add a product to the caller's catalog
    RegisterProduct {
        /// Product JSON
        body: String,
    },
    /// Withdraw or reinstate one of the caller's products
    SetProductActive {
        /// `{"productId":..,"active":..}`
        body: String,
    },
    /// Create a batch and generate its units
    CreateBatch {
        /// `{"productId":..,"manufacturingDate":..,"expiryDate":..,"cartonQnty":..}`
        body: String,
    },
    /// Ship a carton to a distributor
    ShipToDistributor {
        /// `{"customerId":..,"cartonId":..,"transactionDate":..,"perUnitSellingPrice":..}`
        body: String,
    },
    /// Ship a unit to a chemist
    ShipToChemist {
        /// `{"customerId":..,"packetId":..,"transactionDate":..,"perUnitSellingPrice":..}`
        body: String,
    },
    /// Sell a unit to a customer
    SellToCustomer {
        /// `{"customerId":..,"packetId":..,"transactionDate":..}`
        body: String,
    },
    /// Show the custody trail of a unit
    TrackUnit {
        /// Unit id
        unit_id: String,
    },
    /// List the caller's products
    Products,
    /// List the units the caller holds
    Units,
    /// Show a receipt the caller is party to
    ViewReceipt {
        /// Receipt id (the transaction id of the transfer)
        receipt_id: String,
    },
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn identity(cli: &Cli) -> Result<StaticIdentity> {
    let caller = cli
        .caller
        .as_deref()
        .ok_or_else(|| Error::permission_denied("--caller is required for this command"))?;
    let identity = match cli.role.as_deref() {
        Some(claim) => StaticIdentity::with_role(caller, claim.parse::<Role>()?),
        None => StaticIdentity::new(caller),
    };
    Ok(identity)
}

async fn run(cli: Cli, chain: &SupplyChain) -> Result<()> {
    match &cli.command {
        Command::RegisterAdmin { body } => {
            print_json(&chain.register_admin(&identity(&cli)?, decode(body)?).await?)
        }
        Command::RegisterParty { body } => {
            print_json(&chain.register_party(&identity(&cli)?, decode(body)?).await?)
        }
        Command::SetActive { body } => {
            print_json(&chain.set_active(&identity(&cli)?, decode(body)?).await?)
        }
        Command::ViewProfile => {
            println!("{}", chain.view_profile(&identity(&cli)?).await?);
            Ok(())
        }
        Command::UpdateProfile { body } => {
            print_json(&chain.update_profile(&identity(&cli)?, decode(body)?).await?)
        }
        Command::RegisterProduct { body } => {
            print_json(&chain.register_product(&identity(&cli)?, decode(body)?).await?)
        }
        Command::SetProductActive { body } => {
            print_json(&chain.set_product_active(&identity(&cli)?, decode(body)?).await?)
        }
        Command::CreateBatch { body } => {
            print_json(&chain.create_batch(&identity(&cli)?, decode(body)?).await?)
        }
        Command::ShipToDistributor { body } => {
            print_json(&chain.ship_to_distributor(&identity(&cli)?, decode(body)?).await?)
        }
        Command::ShipToChemist { body } => {
            print_json(&chain.ship_to_chemist(&identity(&cli)?, decode(body)?).await?)
        }
        Command::SellToCustomer { body } => {
            print_json(&chain.sell_to_customer(&identity(&cli)?, decode(body)?).await?)
        }
        Command::TrackUnit { unit_id } => print_json(&chain.track_unit(unit_id).await?),
        Command::Products => {
            println!("{}", chain.products_by_manufacturer(&identity(&cli)?).await?);
            Ok(())
        }
        Command::Units => {
            println!("{}", chain.units_by_owner(&identity(&cli)?).await?);
            Ok(())
        }
        Command::ViewReceipt { receipt_id } => {
            println!("{}", chain.view_receipt(&identity(&cli)?, receipt_id).await?);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Load settings, then open the record store
    let settings = load_settings(&cli.config)
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    let chain = SupplyChain::from_settings(&settings)
        .await
        .inspect_err(|e| error!("Failed to open record store: {}", e))?;
    info!(command = ?cli.command, "Running command");

    run(cli, &chain)
        .await
        .inspect_err(|e| error!("Command failed: {}", e))
}
