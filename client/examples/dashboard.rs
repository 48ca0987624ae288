use anyhow::Result;
use stepin_client::{ClientConfig, MeetingCollection, Navigation, Refresh, Store};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ClientConfig::from_env();
    println!("Using API at {}", config.base_url);

    let store = Store::from_config(&config)?;
    store.bootstrap();

    match store.navigate("/") {
        Navigation::Allow(_) => {}
        Navigation::Redirect { to, redirect } => {
            println!("Not signed in, would go to {:?} (then back to {:?})", to, redirect);
            println!("Run the register-user example first.");
            return Ok(());
        }
    }

    let (active, upcoming) = tokio::join!(
        store.get_active_meetings(Refresh::Force),
        store.get_upcoming_meetings(Refresh::Force),
    );

    for meeting in active.iter().chain(&upcoming) {
        let status = meeting.status.map_or("unknown", |s| s.as_str());
        println!(
            "  [{}] {:<8} {} ({} - {})",
            meeting.id, status, meeting.title, meeting.t1, meeting.t2
        );
    }

    store.get_user_created_meetings().await;

    let state = store.snapshot();
    println!(
        "Active: {}, upcoming: {}, created by you: {}",
        state.meetings(MeetingCollection::Active).len(),
        state.meetings(MeetingCollection::Upcoming).len(),
        state.meetings(MeetingCollection::Created).len(),
    );
    if let Some(error) = state.error_message() {
        println!("Last error: {}", error);
    }

    Ok(())
}
