pub mod research;

pub use research::{
    AggregatedGroup, AggregatedItem, IndexedContentItem, Metadata, MetadataKeys, RawResultItem,
    ResearchRecord, ResearchReport, ScoredMatch, SearchResult, Source,
};
