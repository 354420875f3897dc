//! Prints an Argon2 PHC string for `SEED_ADMIN_PASSWORD_HASH` or the
//! `salon_user.password_hash` column.

fn main() -> anyhow::Result<()> {
    let Some(password) = std::env::args().nth(1) else {
        anyhow::bail!("Usage: hashpass <password>");
    };
    let phc = salon_server::auth::hash_password(&password)?;
    println!("{phc}");
    Ok(())
}
