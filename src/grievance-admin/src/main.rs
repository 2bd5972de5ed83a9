//! Grievance Admin CLI: hash administrator passwords for config seeding and
//! inspect the role-to-view table.

use clap::{Parser, Subcommand};
use grievance_core::types::Role;
use grievance_platform::directory::{hash_password, hash_password_with_params};
use grievance_platform::RoleRouter;

#[derive(Parser)]
#[command(name = "grievance-admin")]
#[command(about = "Grievance Express administration tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a password into an Argon2id PHC string
    HashPassword {
        /// Password to hash
        #[arg(short, long)]
        password: String,

        /// Memory cost in KiB (default parameters when omitted)
        #[arg(long, requires_all = ["iterations", "lanes"])]
        memory_kib: Option<u32>,

        /// Iterations
        #[arg(long)]
        iterations: Option<u32>,

        /// Parallel lanes
        #[arg(long)]
        lanes: Option<u32>,
    },

    /// Print a ready-to-paste `[[admins]]` config entry
    Seed {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// Role label, e.g. "Hostel Management"
        #[arg(short, long)]
        role: String,
    },

    /// Resolve a single role label to its view; unknown labels get no access
    Resolve {
        /// Role label, e.g. "Civil Management"
        role: String,
    },

    /// Show which view each role resolves to
    Routes {
        /// Emit JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword {
            password,
            memory_kib,
            iterations,
            lanes,
        } => {
            let hash = match (memory_kib, iterations, lanes) {
                (Some(m), Some(t), Some(p)) => hash_password_with_params(&password, m, t, p)?,
                _ => hash_password(&password)?,
            };
            println!("{hash}");
        }
        Commands::Seed {
            username,
            password,
            role,
        } => {
            let role: Role = role.parse()?;
            let hash = hash_password(&password)?;
            println!("[[admins]]");
            println!("username = {}", serde_json::to_string(&username)?);
            println!("password_hash = {}", serde_json::to_string(&hash)?);
            println!("role = {}", serde_json::to_string(role.as_str())?);
        }
        Commands::Resolve { role } => {
            let view = RoleRouter::permitted_view_for_label(&role);
            println!("{}", serde_json::to_string(&view)?.trim_matches('"'));
        }
        Commands::Routes { json } => {
            let table = RoleRouter::table();
            if json {
                let rows: Vec<_> = table
                    .iter()
                    .map(|(role, view)| serde_json::json!({ "role": role, "view": view }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for (role, view) in table {
                    println!("  {:<24} {}", role.as_str(), serde_json::to_string(&view)?.trim_matches('"'));
                }
            }
        }
    }

    Ok(())
}
