use std::error::Error;
use std::sync::Arc;

use chrono::Local;
use futures::FutureExt;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use chatsync::config::{BACKEND_URL_ENV, Settings};
use chatsync::utils::run_async_to_main;
use chatsync::{
    ApiClient, ConfigError, ConversationApi, ConversationListController, FilterKind, ListEvent,
    MessageThreadController, Notice, ScrollAnchor, ThreadEvent,
};

use crate::ui::{chat_view, sidebar};

enum AppEvent {
    List(ListEvent),
    Thread(ThreadEvent),
    Input(Option<String>),
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    Help,
    Refresh,
    Filter(String),
    Search(String),
    Open(usize),
    Back,
    Retry,
    Text(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Text(line.to_string());
        };
        let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        match name {
            "quit" | "q" => Command::Quit,
            "refresh" => Command::Refresh,
            "filter" => Command::Filter(arg.trim().to_string()),
            "search" => Command::Search(arg.to_string()),
            "open" => match arg.trim().parse() {
                Ok(n) => Command::Open(n),
                Err(_) => Command::Help,
            },
            "back" => Command::Back,
            "retry" => Command::Retry,
            _ => Command::Help,
        }
    }
}

const HELP: &str = "\
/filter all|unread|favourites|groups   /search <text>   /open <n>   /refresh
in a chat: type to send, /back to return, /retry after a failed load   /quit";

fn show_notice(notice: &Notice) {
    eprintln!("! {}", notice);
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    let settings = Settings::load()?;
    let base_url = match settings.base_url() {
        Ok(url) => url,
        Err(ConfigError::MissingBaseUrl) => {
            let hint = Settings::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "chatsync.toml".into());
            eprintln!("Set base_url in {} or export {}.", hint, BACKEND_URL_ENV);
            return Err(ConfigError::MissingBaseUrl.into());
        }
        Err(e) => return Err(e.into()),
    };
    let style = settings.label_style();
    let api: Arc<dyn ConversationApi> = Arc::new(ApiClient::new(&base_url, settings.request_timeout())?);
    info!("using backend {}", base_url);

    {
        let api = Arc::clone(&api);
        tokio::spawn(async move {
            match api.ping().await {
                Ok(banner) => info!("backend says: {}", banner),
                Err(err) => warn!("backend health check failed: {}", err),
            }
        });
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = lines.next_line().await.ok().flatten();
                let done = line.is_none();
                if tx.send(AppEvent::Input(line)).is_err() || done {
                    break;
                }
            }
        });
    }

    let mut list = ConversationListController::new(Arc::clone(&api));
    let mut thread = MessageThreadController::new(Arc::clone(&api));
    let mut anchor = ScrollAnchor::default();

    println!("{}", HELP);
    run_async_to_main(list.refresh().map(AppEvent::List), &tx);
    sidebar::render(&list, style, &Local::now());

    while let Some(event) = rx.recv().await {
        let in_thread = thread.conversation_id().is_some();
        match event {
            AppEvent::List(ev) => {
                if let Some(notice) = list.apply(ev) {
                    show_notice(&notice);
                }
                if !in_thread {
                    sidebar::render(&list, style, &Local::now());
                }
            }
            AppEvent::Thread(ev) => {
                if let Some(notice) = thread.apply(ev) {
                    show_notice(&notice);
                }
                if thread.conversation_id().is_some() {
                    chat_view::render(&thread, &mut anchor, &Local);
                }
            }
            AppEvent::Input(None) => break,
            AppEvent::Input(Some(line)) => match Command::parse(&line) {
                Command::Quit => break,
                Command::Help => println!("{}", HELP),
                Command::Refresh => {
                    run_async_to_main(list.refresh().map(AppEvent::List), &tx);
                }
                Command::Filter(name) => match FilterKind::from_name(&name) {
                    Some(kind) => {
                        list.set_filter(kind);
                        sidebar::render(&list, style, &Local::now());
                    }
                    None => println!("{}", HELP),
                },
                Command::Search(text) => {
                    list.set_search_text(text);
                    sidebar::render(&list, style, &Local::now());
                }
                Command::Open(n) => {
                    let target = list
                        .derived_view()
                        .items
                        .get(n.wrapping_sub(1))
                        .map(|c| (c.id.clone(), c.display_name.clone()));
                    match target {
                        Some((id, name)) => {
                            let load = thread.open(id, name);
                            run_async_to_main(load.map(AppEvent::Thread), &tx);
                            chat_view::render(&thread, &mut anchor, &Local);
                        }
                        None => println!("No conversation #{}", n),
                    }
                }
                Command::Back => {
                    thread.dispose();
                    run_async_to_main(list.refresh().map(AppEvent::List), &tx);
                }
                Command::Retry => {
                    if let Some(load) = thread.retry() {
                        run_async_to_main(load.map(AppEvent::Thread), &tx);
                        chat_view::render(&thread, &mut anchor, &Local);
                    }
                }
                Command::Text(text) if in_thread => {
                    thread.set_compose(text);
                    match thread.submit() {
                        Ok(send) => {
                            run_async_to_main(send.map(AppEvent::Thread), &tx);
                            chat_view::render(&thread, &mut anchor, &Local);
                        }
                        Err(rejected) => debug!("send ignored: {}", rejected),
                    }
                }
                Command::Text(_) => println!("{}", HELP),
            },
        }
    }
    Ok(())
}
