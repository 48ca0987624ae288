use anyhow::{Result, bail};
use stepin_client::{ClientConfig, MeetingId, Navigation, Store};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    let meeting = std::env::var("STEPIN_MEETING").expect("Set STEPIN_MEETING environment variable");
    let meeting = MeetingId::new(meeting);

    let store = Store::from_config(&ClientConfig::from_env())?;
    if store.bootstrap().is_none() {
        bail!("No stored session, run the register-user example first");
    }

    store.join_meeting(&meeting).await?;
    if !matches!(store.navigate("/chat"), Navigation::Allow(_)) {
        bail!("Joining {} did not open the chat room", meeting);
    }

    for message in store.get_meeting_messages(&meeting).await? {
        println!("{}: {}", message.email, message.message);
    }
    println!("Type a message, /quit to leave");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "/quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        if let Err(e) = store.post_message(line, Some(&meeting)).await {
            println!("Error: {}", e);
        }
    }

    store.leave_meeting(&meeting).await?;
    println!("Left meeting {}", meeting);
    Ok(())
}
