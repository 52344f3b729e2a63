use std::time::Duration;

use futrace::{
    Cancelled,
    futures::{Combinators, unit},
    trace::Traced,
    with_trace,
};
use tokio::{runtime::Runtime, time::sleep};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
enum AppError {
    #[error("user {0} not found")]
    NotFound(u32),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

type Result<T> = std::result::Result<T, Traced<AppError>>;

fn main() {
    Runtime::new().unwrap().block_on(async {
        match handle(1).await {
            Ok(summary) => println!("{summary}"),
            Err(err) => println!("{err}"),
        }

        match handle(7).await {
            Ok(summary) => println!("{summary}"),
            Err(err) => println!("{err}"),
        }
    })
}

async fn load_user(id: u32) -> Result<(u32, &'static str)> {
    sleep(Duration::from_millis(10)).await;
    match id {
        1 => Ok((1, "ana")),
        _ => Err(Traced::new(AppError::NotFound(id))),
    }
}

async fn load_balance(id: u32) -> Result<(u32, i64)> {
    sleep(Duration::from_millis(10)).await;
    Ok((id, 1200))
}

async fn summarize(id: u32) -> Result<String> {
    let user = futrace::tokio::spawn(with_trace!(load_user(id)));
    let balance = futrace::tokio::spawn(with_trace!(load_balance(id)));

    with_trace!(user.join(balance, |u| u.0, |b| b.0, |u, b| format!("{}: {}", u.1, b.1))).await
}

async fn handle(id: u32) -> Result<String> {
    let summary = unit(id)
        .filter(|id| *id != 0)
        .bind(summarize);
    with_trace!(summary).await
}
