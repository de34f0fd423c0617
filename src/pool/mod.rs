// Worker-thread pool: type-erased tasks, a fixed worker set, and a task DAG

mod dag;
mod task;
mod thread_pool;

// Public exports
pub use dag::{DagError, TaskDag};
pub use task::{next_task_id, Task, TaskFuture, TaskId, TaskValue, UNASSIGNED_TASK_ID};
pub use thread_pool::ThreadPool;
