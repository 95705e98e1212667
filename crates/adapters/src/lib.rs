pub mod fs;
pub mod mediainfo;
pub mod presenters;
pub mod riff;
pub mod tags;

pub use fs::{FsCreationTimeStore, WalkdirFileScanner};
pub use mediainfo::MediaInfoCliProber;
pub use presenters::{
    present_blocked, present_change, present_metadata, present_report_json, present_scan_banner,
    present_statistics_json, present_summary,
};
pub use riff::RiffInfoTagStore;
pub use tags::{ContainerTagStore, LoftyTagStore};
