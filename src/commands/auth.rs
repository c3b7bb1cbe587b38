use anyhow::Result;

use crate::config::Config;
use crate::google;

pub async fn run() -> Result<()> {
    println!("Authenticating with Google...");

    // The flow stores credentials/tokens under the google config dir
    let account = google::authenticate().await?;

    println!("Authenticated as: {}\n", account);

    let mut config = Config::load()?;
    config.account = Some(account);
    config.save()?;

    println!("Run `weeksync apply` to materialize your schedule.");

    Ok(())
}
