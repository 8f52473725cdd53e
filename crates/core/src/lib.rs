pub mod backend;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod effects;
pub mod metrics;
pub mod poller;
pub mod presenter;
pub mod selection;
pub mod submission;
pub mod testing;

pub use backend::{
    BackendError, ConversionBackend, ConversionRequest, HttpBackend, RemoteStatus, StatusReport,
    TaskDescriptor, TaskId,
};
pub use catalog::{formats_for, FormatChoices, MediaClass};
pub use clock::{Clock, TokioClock};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, BackendConfig,
    Config, ConfigError, OutputConfig,
};
pub use effects::{
    DownloadLedger, Downloader, FileDownloader, Preview, PreviewKind, SideEffectDispatcher,
};
pub use poller::{
    ConversionOrchestrator, OrchestratorStatus, PollDecision, PollerConfig, Task, TaskPoller,
    TaskState,
};
pub use presenter::{LogPresenter, Presenter};
pub use selection::{SelectedFile, Selection, SelectionError, SelectionStore};
pub use submission::{SubmissionDispatcher, SubmitError};
