use std::fmt::{Debug, Display};

use community_library::community_library_web_server::LibraryWebServer;
use community_library::core::{get_subscriber, init_subscriber, AppConfig};
use tokio::task::JoinError;

use colored::*;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let file_appender = tracing_appender::rolling::daily("/var/tmp/log/community_library", "app");

    let subscriber = get_subscriber("community_library".into(), "info".into(), file_appender);
    init_subscriber(subscriber);

    let config = AppConfig::new().expect("cant build our appConfig object");

    let library_web_server = LibraryWebServer::build(config.clone())
        .await
        .expect("application could run for some obvious reasons");

    let server_task = tokio::spawn(library_web_server.run_until_stopped());

    println!("{}", "-----------------------------------------".green());
    println!(
        "🚀 Server started on Addr: {}:{}",
        config.library_server_config.host, config.library_server_config.port
    );
    println!("{}", "-----------------------------------------".green());

    tokio::select! {
        o = server_task => {report_exit("library web server", o);}
    }
    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{}' task failed to complete",
                task_name
            )
        }
    }
}
