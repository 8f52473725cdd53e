//! Testing utilities and mock implementations.
//!
//! Mocks for every seam the orchestrator talks through, so the whole task
//! lifecycle can be exercised without a conversion server.
//!
//! # Example
//!
//! ```rust,ignore
//! use convertino_core::testing::{MockBackend, RecordingPresenter, ScriptedStatus};
//!
//! let backend = Arc::new(MockBackend::new());
//! let presenter = Arc::new(RecordingPresenter::new());
//!
//! // Configure mock responses
//! backend.set_submit_response(vec![fixtures::descriptor("t1", "clip.mov", "clip.mp4")]).await;
//! backend.script_status(&TaskId::new("t1"), vec![/* answers */]).await;
//!
//! // Build a ConversionOrchestrator...
//! ```

mod mock_backend;
mod mock_presenter;
mod stepping_clock;

pub use mock_backend::{MockBackend, RecordedStatusCall, ScriptedStatus};
pub use mock_presenter::{MockDownloader, PresenterEvent, RecordingPresenter};
pub use stepping_clock::SteppingClock;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::backend::{TaskDescriptor, TaskId};
    use crate::poller::Task;
    use crate::selection::{SelectedFile, Selection};

    /// Create a task descriptor as returned by `/convert`.
    pub fn descriptor(task_id: &str, input_file: &str, output_file: &str) -> TaskDescriptor {
        TaskDescriptor {
            task_id: TaskId::new(task_id),
            input_file: input_file.to_string(),
            output_file: output_file.to_string(),
        }
    }

    /// Create a freshly submitted task.
    pub fn task(task_id: &str, input_file: &str, output_file: &str) -> Task {
        Task::from_descriptor(descriptor(task_id, input_file, output_file))
    }

    /// Create a selected file with its media type guessed from the name.
    pub fn selected_file(name: &str) -> SelectedFile {
        let media_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        SelectedFile::new(name, media_type, Path::new("/media").join(name))
    }

    /// Create a selection from file names.
    pub fn selection(names: &[&str]) -> Selection {
        Selection::new(names.iter().map(|n| selected_file(n)))
    }
}
