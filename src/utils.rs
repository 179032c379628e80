use std::future::Future;

use tokio::sync::mpsc::UnboundedSender;

/// Run `fut` on the runtime and deliver its output to the event loop that
/// owns the controllers. A closed loop drops the result.
pub fn run_async_to_main<T, Fut>(fut: Fut, tx: &UnboundedSender<T>)
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let res = fut.await;
        let _ = tx.send(res);
    });
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn adds_https_when_scheme_missing() {
        assert_eq!(normalize_url(" chat.example "), "https://chat.example");
        assert_eq!(normalize_url("http://localhost:8001"), "http://localhost:8001");
    }

    #[tokio::test]
    async fn results_arrive_on_the_main_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        run_async_to_main(async { 1 + 1 }, &tx);
        run_async_to_main(async { 40 + 2 }, &tx);
        let mut got = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        got.sort();
        assert_eq!(got, vec![2, 42]);
    }
}
