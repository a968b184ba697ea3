//! Chat task registry - tracks pending responder deliveries for one session

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

/// A pending reply waiting out its delay
pub struct ReplyTask {
    pub task_id: String,
    /// Whether the typing indicator is shown for this reply
    pub shows_typing: bool,
    pub cancel_token: CancellationToken,
}

/// Registry of pending reply tasks (keyed by task_id)
#[derive(Default)]
pub struct TaskRegistry {
    tasks: DashMap<String, ReplyTask>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task and return its cancellation token
    pub fn register(&self, task_id: String, shows_typing: bool) -> CancellationToken {
        let cancel_token = CancellationToken::new();
        self.tasks.insert(
            task_id.clone(),
            ReplyTask {
                task_id,
                shows_typing,
                cancel_token: cancel_token.clone(),
            },
        );
        cancel_token
    }

    /// Remove a finished task from the registry
    pub fn remove(&self, task_id: &str) -> Option<ReplyTask> {
        self.tasks.remove(task_id).map(|(_, task)| task)
    }

    /// Cancel a specific task by id
    pub fn cancel(&self, task_id: &str) -> bool {
        match self.tasks.remove(task_id) {
            Some((_, task)) => {
                task.cancel_token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel and remove every pending task. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<String> = self.tasks.iter().map(|entry| entry.key().clone()).collect();

        ids.iter().filter(|id| self.cancel(id)).count()
    }

    /// Whether a reply that shows the typing indicator is pending
    pub fn is_typing(&self) -> bool {
        self.tasks.iter().any(|entry| entry.shows_typing)
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}
