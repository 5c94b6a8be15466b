//! Realtime CLI client for the ichiba marketplace.
//!
//! Tails the account-wide notification stream, or joins one chat room and
//! sends messages from stdin. Automatically reconnects on disconnection
//! (max 5 attempts with exponential backoff starting at 5 seconds).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin ichiba-client -- --token <TOKEN> --user-id 7
//! cargo run --bin ichiba-client -- --token <TOKEN> --user-id 7 --room 42
//! ```

use std::sync::Arc;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use ichiba_client::{
    ChatApi, ChatMessage, ClientConfig, ClientError, Connection, ConnectionScope, Dispatcher,
    HttpApi, NotificationFeed, RoomFeed, StaticCredentials, StreamHandler,
    formatter::MessageFormatter,
    protocol::{ChatRoomInfo, Notification, PaymentAgreement},
    ui::redisplay_prompt,
};
use ichiba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "ichiba-client")]
#[command(about = "Realtime notification and chat client for ichiba", long_about = None)]
struct Args {
    /// Backend REST base URL (the WebSocket URL is derived from it)
    #[arg(short = 'a', long, default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// Bearer token of the signed-in user
    #[arg(short = 't', long)]
    token: String,

    /// Numeric id of the signed-in user
    #[arg(short = 'u', long)]
    user_id: i64,

    /// Chat room to join; without it the client tails the notification stream
    #[arg(short = 'r', long)]
    room: Option<i64>,

    /// Skip the realtime connection and only print the REST snapshot
    #[arg(long)]
    no_realtime: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ClientError> {
    let mut config = ClientConfig::new(args.api_url.clone());
    if args.no_realtime {
        config = config.without_realtime();
    }
    let credentials = StaticCredentials::new(args.token.clone(), args.user_id);
    let api = HttpApi::new(&config, &credentials)?;

    if args.no_realtime {
        let feed = NotificationFeed::new();
        feed.refresh(&api).await?;
        print_notification_list(&feed);
        return Ok(());
    }

    match args.room {
        Some(room_id) => run_room_chat(&config, &credentials, &api, room_id, args.user_id).await,
        None => run_notification_tail(&config, &credentials, &api).await,
    }
}

fn print_notification_list(feed: &NotificationFeed) {
    let view = feed.view();
    print!(
        "{}",
        MessageFormatter::format_unread_banner(feed.unread_count(), view.len())
    );
    for notification in &view {
        print!("{}", MessageFormatter::format_notification(notification));
    }
}

/// Handler that forwards stream events into the feed and prints them
struct PrintingFeed {
    feed: Arc<NotificationFeed>,
}

impl StreamHandler for PrintingFeed {
    fn on_notification(&self, notification: Notification) {
        self.feed.on_notification(notification.clone());
        print!("{}", MessageFormatter::format_notification(&notification));
        print!(
            "{}",
            MessageFormatter::format_unread_banner(self.feed.unread_count(), self.feed.view().len())
        );
    }

    fn on_initial_notifications(&self, notifications: Vec<Notification>) {
        self.feed.on_initial_notifications(notifications);
        print_notification_list(&self.feed);
    }

    fn on_interest_accepted(&self, request_id: i64) {
        self.feed.on_interest_accepted(request_id);
        println!("\nInterest request {} was accepted", request_id);
    }
}

async fn run_notification_tail(
    config: &ClientConfig,
    credentials: &StaticCredentials,
    api: &HttpApi,
) -> Result<(), ClientError> {
    let feed = Arc::new(NotificationFeed::new());
    let handler = Arc::new(PrintingFeed { feed: feed.clone() });
    let handle = Connection::open(
        config,
        ConnectionScope::Updates,
        credentials,
        Dispatcher::new(handler),
    )?;

    // Fetch the snapshot while the stream connects; the feed merges both
    if let Err(e) = feed.refresh(api).await {
        tracing::warn!("Failed to fetch notification snapshot: {}", e);
    }
    print_notification_list(&feed);
    println!("\nTailing notifications. Press Ctrl+C to exit.");

    let mut state_rx = handle.state_watch();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow();
                print!("{}", MessageFormatter::format_connection_state(state));
                if state.is_terminal() {
                    break;
                }
            }
        }
    }

    handle.close();
    Ok(())
}

/// Handler that forwards stream events into the room feed and prints them
struct PrintingRoom {
    feed: Arc<RoomFeed>,
}

impl StreamHandler for PrintingRoom {
    fn on_chat_message(&self, message: ChatMessage) {
        self.feed.on_chat_message(message.clone());
        print!("{}", MessageFormatter::format_chat_message(&message));
        redisplay_prompt("you");
    }

    fn on_message_read(&self, message_id: i64) {
        self.feed.on_message_read(message_id);
    }

    fn on_payment_agreement(&self, agreement: PaymentAgreement) {
        let synthesized_id = -agreement.id;
        self.feed.on_payment_agreement(agreement);
        if let Some(message) = self
            .feed
            .messages()
            .into_iter()
            .find(|m| m.id == synthesized_id)
        {
            print!("{}", MessageFormatter::format_chat_message(&message));
            redisplay_prompt("you");
        }
    }

    fn on_chat_room_created(&self, chat_room: ChatRoomInfo) {
        self.feed.on_chat_room_created(chat_room);
    }
}

async fn run_room_chat(
    config: &ClientConfig,
    credentials: &StaticCredentials,
    api: &HttpApi,
    room_id: i64,
    user_id: i64,
) -> Result<(), ClientError> {
    let feed = Arc::new(RoomFeed::new());
    let handler = Arc::new(PrintingRoom { feed: feed.clone() });
    let handle = Connection::open(
        config,
        ConnectionScope::Room(room_id),
        credentials,
        Dispatcher::new(handler),
    )?;

    match api.room_messages(room_id).await {
        Ok(history) => {
            feed.load_history(history);
            for message in feed.messages() {
                print!("{}", MessageFormatter::format_chat_message(&message));
            }
            let unread = feed.unread_from_others(user_id);
            if unread > 0 {
                println!("\n({} unread)", unread);
            }
        }
        Err(e) => tracing::warn!("Failed to fetch room history: {}", e),
    }

    println!(
        "\nJoined room {}. Type messages and press Enter to send. Press Ctrl+C to exit.",
        room_id
    );

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline("you> ") {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let mut state_rx = handle.state_watch();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = input_rx.recv() => {
                match line {
                    Some(content) => {
                        if feed.send_message(content, &handle) {
                            print!(
                                "\n{}",
                                MessageFormatter::format_sent_confirmation(chrono::Utc::now())
                            );
                        }
                        redisplay_prompt("you");
                    }
                    None => break,
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow();
                print!("{}", MessageFormatter::format_connection_state(state));
                if state.is_terminal() {
                    break;
                }
                redisplay_prompt("you");
            }
        }
    }

    handle.close();
    Ok(())
}
