mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hospitalkit::config::AppConfig;
use hospitalkit::database::schema;
use hospitalkit::{ConnectionManager, Registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "hospital-cli")]
#[command(about = "Manage hospitals, departments, patients and staff in ScyllaDB")]
struct Cli {
    #[arg(short, long, default_value = "config/hospital.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the keyspace and tables, then exit
    Init,
    #[command(subcommand)]
    Hospital(HospitalCommand),
    #[command(subcommand)]
    Department(DepartmentCommand),
    #[command(subcommand)]
    Patient(PatientCommand),
    #[command(subcommand)]
    Staff(StaffCommand),
}

#[derive(Subcommand, Debug)]
enum HospitalCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        phone: Option<String>,
    },
    List,
    Show {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, conflicts_with = "phone")]
        clear_phone: bool,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum DepartmentCommand {
    Add {
        #[arg(long)]
        hospital: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        head_doctor_id: Option<i32>,
    },
    /// List every department, or those of one hospital
    List {
        #[arg(long)]
        hospital: Option<String>,
    },
    /// Without --hospital the lookup scans the whole table
    Show {
        id: String,
        #[arg(long)]
        hospital: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        hospital: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        head_doctor_id: Option<i32>,
    },
    Delete {
        id: String,
        #[arg(long)]
        hospital: String,
    },
}

#[derive(Args, Debug)]
struct PersonName {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
}

#[derive(Subcommand, Debug)]
enum PatientCommand {
    Add {
        #[arg(long)]
        department: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        dob: String,
        /// Defaults to the age derived from the date of birth
        #[arg(long)]
        age: Option<i32>,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        medical_record: Option<String>,
    },
    List {
        #[arg(long)]
        department: Option<String>,
    },
    Show {
        id: String,
        #[arg(long)]
        department: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        department: String,
        #[command(flatten)]
        name: PersonName,
        /// Also recomputes the stored age
        #[arg(long)]
        dob: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        medical_record: Option<String>,
    },
    Delete {
        id: String,
        #[arg(long)]
        department: String,
    },
    /// Exact match on names, or on the phone number when --phone is given
    Search {
        #[command(flatten)]
        name: PersonName,
        #[arg(long, conflicts_with_all = ["first_name", "last_name"])]
        phone: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum StaffCommand {
    Add {
        #[arg(long)]
        department: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        age: i32,
        #[arg(long)]
        position: String,
    },
    List {
        #[arg(long)]
        department: Option<String>,
    },
    Show {
        id: String,
        #[arg(long)]
        department: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        department: String,
        #[command(flatten)]
        name: PersonName,
        #[arg(long)]
        age: Option<i32>,
        #[arg(long)]
        position: Option<String>,
    },
    Delete {
        id: String,
        #[arg(long)]
        department: String,
    },
    Search {
        #[command(flatten)]
        name: PersonName,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: AppConfig = hospitalkit::config::load_config(&cli.config)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "hospital_cli={level},hospitalkit={level}",
                    level = config.observability.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut manager = ConnectionManager::new(config.database.clone());
    let connection = manager.connect_default().await?;
    schema::initialize(
        &connection,
        &config.database.keyspace,
        config.database.replication_factor,
    )
    .await?;

    let registry = Registry::new(connection);
    let result = match cli.command {
        Command::Init => {
            println!("Keyspace {} is ready", config.database.keyspace);
            Ok(())
        }
        Command::Hospital(command) => commands::hospital(&registry, command).await,
        Command::Department(command) => commands::department(&registry, command).await,
        Command::Patient(command) => commands::patient(&registry, command).await,
        Command::Staff(command) => commands::staff(&registry, command).await,
    };

    manager.close();
    result
}
