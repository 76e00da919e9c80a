//! Account commands

use crate::app::AppState;
use anyhow::Result;

pub async fn login(app: &AppState, email: &str) -> Result<()> {
    let mut session = app.open_session().await?;
    let user = session.login(email).await?;

    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn logout(app: &AppState) -> Result<()> {
    let mut session = app.open_session().await?;
    if session.user().is_none() {
        println!("Not logged in");
        return Ok(());
    }

    session.logout().await?;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(app: &AppState) -> Result<()> {
    let session = app.open_session().await?;
    match session.user() {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            println!("avatar: {}", user.profile_pic);
        }
        None => println!("Not logged in"),
    }
    Ok(())
}
