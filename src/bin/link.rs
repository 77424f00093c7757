// Interactive account-linking tool: obtains the initial credential pair
// and the vehicle id the polling daemon needs.
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};

use vehicle_telemetry::application::credential_store::CredentialStore;
use vehicle_telemetry::domain::credentials::CredentialPair;
use vehicle_telemetry::infrastructure::api_client::{
    self, ApiTransport, ReqwestTransport,
};
use vehicle_telemetry::infrastructure::config::{TOKENS_PATH, load_app_config};
use vehicle_telemetry::infrastructure::token_store::FileTokenStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_app_config()?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api.request_timeout_secs))
        .build()?;
    let transport: Arc<dyn ApiTransport> =
        Arc::new(ReqwestTransport::new(http, config.api.base_url.clone()));

    println!("Vehicle account linking");
    println!("=======================");

    let phone = normalize_phone(&prompt("Phone number (e.g. 79001234567): ")?);
    if phone.is_empty() {
        bail!("phone number must contain digits");
    }

    println!("Requesting SMS code for {phone}...");
    api_client::request_sms(transport.as_ref(), &phone).await?;

    let code = prompt("SMS code: ")?;
    let mut credentials = api_client::sign_in(transport.as_ref(), &phone, &code).await?;
    println!("Authenticated.");

    select_organization(transport.as_ref(), &mut credentials).await?;

    let vehicles =
        api_client::search_vehicles(transport.as_ref(), &credentials.access_token).await?;
    if vehicles.is_empty() {
        bail!("no vehicles are linked to this account");
    }
    let labels: Vec<String> = vehicles.iter().map(|v| v.label()).collect();
    let vehicle = &vehicles[pick("vehicle", &labels)?];

    let mut store = FileTokenStore::new(TOKENS_PATH);
    store
        .save(&credentials)
        .context("failed to persist credentials")?;

    println!();
    println!("Credentials saved to {TOKENS_PATH}.");
    println!("Set this vehicle id in config/vehicle.toml:");
    println!();
    println!("  car_id = \"{}\"", vehicle.id);

    Ok(())
}

/// Pick an organization when the account has any; single-org accounts are
/// selected automatically. Organization sign-in may rotate the pair.
async fn select_organization(
    transport: &dyn ApiTransport,
    credentials: &mut CredentialPair,
) -> anyhow::Result<()> {
    let orgs = api_client::organizations(transport, &credentials.access_token).await?;
    if orgs.is_empty() {
        println!("No organizations on this account, continuing.");
        return Ok(());
    }

    let index = if orgs.len() == 1 {
        println!("Auto-selected the only organization: {}", orgs[0].name);
        0
    } else {
        let labels: Vec<String> = orgs.iter().map(|o| o.name.clone()).collect();
        pick("organization", &labels)?
    };

    match api_client::sign_in_org(transport, &credentials.access_token, &orgs[index].id).await {
        Ok(Some(rotated)) => {
            *credentials = rotated;
            println!("Organization selected, tokens updated.");
        }
        Ok(None) => println!("Organization selected."),
        // Not fatal: account-scoped tokens usually still see the vehicles.
        Err(err) => println!("Organization sign-in failed ({err}), continuing without it."),
    }
    Ok(())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Numbered picker over a list of labels; returns the chosen index.
fn pick(what: &str, labels: &[String]) -> anyhow::Result<usize> {
    if labels.len() == 1 {
        println!("Auto-selected the only {what}: {}", labels[0]);
        return Ok(0);
    }

    println!("Available {what}s:");
    for (i, label) in labels.iter().enumerate() {
        println!("  {}. {label}", i + 1);
    }
    loop {
        let raw = prompt(&format!("Select {what} [1-{}]: ", labels.len()))?;
        if let Ok(choice) = raw.parse::<usize>() {
            if (1..=labels.len()).contains(&choice) {
                return Ok(choice - 1);
            }
        }
        println!("Invalid choice, try again.");
    }
}
