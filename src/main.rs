use log::*;
use tokio::sync::mpsc;
use trivia_quiz::{
    app::App,
    config::Config,
    persistence::{FileStore, PersistenceClient},
    question_source::OpenTdbClient,
    terminal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    info!("Starting trivia quiz");

    let config = Config::from_env()?;
    let store = FileStore::new(config.data_dir.clone());
    info!("Storing preferences and scores in {}", store.dir().display());
    let persistence = PersistenceClient::new(Box::new(store));
    let source = OpenTdbClient::new(&config.api_url, config.fetch_retries)?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (actions_tx, actions_rx) = mpsc::unbounded_channel();

    let app = App::new(source, persistence, events_tx)
        .with_feedback_delay(config.feedback_delay)
        .with_defaults(config.quiz_defaults());

    let printer = tokio::spawn(terminal::print_events(events_rx));

    // stdin reads block; keep them off the runtime
    let defaults = config.quiz_defaults();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        terminal::read_commands(stdin.lock(), std::io::stdout(), actions_tx, defaults);
    });

    app.run(actions_rx).await;
    // App dropped: the event channel closes and the printer drains what is left
    printer.await?;
    info!("Goodbye");
    Ok(())
}
