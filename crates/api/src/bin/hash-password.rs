//! Password hashing utility for GODS
//!
//! Produces an Argon2id PHC string for a password that passes the account
//! password policy, for seeding users directly in the database.
//!
//! Usage:
//!   hash-password
//!   hash-password "MyS3cure!Password"
//!
//! Reading from stdin keeps the password out of the process list.

use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

use gods_api::auth::{hash_password, validate_password_strength};

fn main() -> anyhow::Result<ExitCode> {
    let password = match env::args().nth(1) {
        Some(pwd) => pwd,
        None => {
            print!("Enter password to hash: ");
            io::stdout().flush()?;

            let mut password = String::new();
            io::stdin().read_line(&mut password)?;
            password.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if let Err(e) = validate_password_strength(&password) {
        eprintln!("Error: {e}");
        return Ok(ExitCode::FAILURE);
    }

    let password_hash = hash_password(&password)?;

    println!("\n===========================================");
    println!("Password Hash (Argon2id):");
    println!("===========================================");
    println!("{password_hash}");
    println!("===========================================\n");

    println!("Example SQL:");
    println!("UPDATE users SET password_hash = '{password_hash}' WHERE name = 'admin';");

    Ok(ExitCode::SUCCESS)
}
