//! Side effects returned from `update()` and executed by the runtime.

use std::future::Future;

use futures::future::BoxFuture;

pub enum Command<Msg> {
    /// Do nothing
    None,

    /// Execute multiple commands in sequence
    Batch(Vec<Command<Msg>>),

    /// Perform an async operation and send the result as a message
    Perform(BoxFuture<'static, Msg>),

    /// Quit the application
    Quit,
}

impl<Msg: Send + 'static> Command<Msg> {
    /// Helper to create a command that performs an async operation
    pub fn perform<F, T>(future: F, to_msg: impl Fn(T) -> Msg + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Command::Perform(Box::pin(async move {
            let result = future.await;
            to_msg(result)
        }))
    }

    pub fn batch(commands: Vec<Command<Msg>>) -> Self {
        Command::Batch(commands)
    }

    /// Re-wrap this command's messages, used to lift screen messages into
    /// app messages.
    pub fn map<M2, F>(self, f: F) -> Command<M2>
    where
        M2: Send + 'static,
        F: Fn(Msg) -> M2 + Clone + Send + 'static,
    {
        match self {
            Command::None => Command::None,
            Command::Quit => Command::Quit,
            Command::Batch(commands) => {
                Command::Batch(commands.into_iter().map(|c| c.map(f.clone())).collect())
            }
            Command::Perform(future) => Command::Perform(Box::pin(async move {
                // Bind the result before calling `f` so the future captures
                // `f` by value rather than borrowing it across the await.
                let msg = future.await;
                f(msg)
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Inner {
        Done(u32),
    }

    #[derive(Debug, PartialEq)]
    enum Outer {
        Inner(Inner),
    }

    #[tokio::test]
    async fn test_mapped_perform_runs_on_a_spawned_task() {
        let cmd = Command::perform(async { 7 }, Inner::Done).map(Outer::Inner);

        // The runtime hands every Perform future to tokio::spawn, so the
        // mapped future must stay Send.
        let Command::Perform(future) = cmd else {
            panic!("expected a Perform command");
        };
        let msg = tokio::spawn(future).await.unwrap();
        assert_eq!(msg, Outer::Inner(Inner::Done(7)));
    }

    #[tokio::test]
    async fn test_map_recurses_into_batches() {
        let cmd = Command::batch(vec![
            Command::None,
            Command::perform(async { 1 }, Inner::Done),
        ])
        .map(Outer::Inner);

        let Command::Batch(cmds) = cmd else {
            panic!("expected a Batch command");
        };
        assert!(matches!(cmds[0], Command::None));
        let Command::Perform(future) = &cmds[1] else {
            panic!("expected a Perform command");
        };
        let _ = future;
    }
}
