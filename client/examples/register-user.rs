use anyhow::Result;
use stepin_client::{ClientConfig, NewUser, Store};

#[tokio::main]
async fn main() -> Result<()> {
    let email = std::env::var("STEPIN_EMAIL").expect("Set STEPIN_EMAIL environment variable");
    let name = std::env::var("STEPIN_NAME").expect("Set STEPIN_NAME environment variable");

    let store = Store::from_config(&ClientConfig::from_env())?;

    let response = store.create_user(&NewUser::new(email, name)).await?;
    if response.success {
        let user = store.current_user();
        println!("Registered and signed in as: {:?}", user.map(|u| u.email));
    } else {
        println!("Registration was not accepted");
    }

    Ok(())
}
