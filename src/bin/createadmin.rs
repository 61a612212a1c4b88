use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use curenet::{
    admin::provision::{provision_admin, NewAdmin},
    state::AppState,
};

#[derive(Parser)]
#[command(name = "createadmin")]
#[command(about = "Creates a superuser/admin account with ADMIN role")]
struct Args {
    /// Username for admin
    #[arg(long)]
    username: Option<String>,

    /// Email for admin
    #[arg(long)]
    email: Option<String>,

    /// Password for admin
    #[arg(long)]
    password: Option<String>,

    /// Use provided arguments without prompts
    #[arg(long)]
    noinput: bool,
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn fill(value: Option<String>, label: &str, noinput: bool) -> io::Result<String> {
    match value {
        Some(v) => Ok(v),
        None if noinput => Ok(String::new()),
        None => prompt(label),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    curenet::init_tracing();

    let args = Args::parse();
    let admin = NewAdmin {
        username: fill(args.username, "Username", args.noinput)?,
        email: fill(args.email, "Email", args.noinput)?,
        password: fill(args.password, "Password", args.noinput)?,
    };

    let state = AppState::init().await?;
    match provision_admin(state.store.as_ref(), admin).await {
        Ok(user) => {
            println!("Successfully created admin user: {}", user.username);
            println!("Email: {}", user.email);
            println!("Role: {}", user.role.label());
            println!("You can now login at /login");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
