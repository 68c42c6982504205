//! State engine behind the stories list: a persisted search term, a one-shot
//! asynchronous load, the loaded collection and the filtered view over it.

pub mod collection;
pub mod controller;
pub mod http_source;
pub mod loader;
pub mod persistent_cell;
pub mod view;

pub use collection::CollectionStore;
pub use controller::{ControllerEvent, StoriesController};
pub use http_source::HttpStorySource;
pub use loader::{AsyncCollectionLoader, CollectionSource, LoadState, SimulatedStorySource};
pub use persistent_cell::{PersistentCell, DEFAULT_SEARCH_TERM, SEARCH_TERM_KEY};
pub use view::filter;
