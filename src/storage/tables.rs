use redb::TableDefinition;

/// Video records: uuid -> VideoRecord (msgpack)
pub const VIDEOS: TableDefinition<&str, &[u8]> = TableDefinition::new("videos");

/// Owner index: user uuid -> msgpack Vec of video UUIDs
pub const USER_VIDEOS: TableDefinition<&str, &[u8]> = TableDefinition::new("user_videos");
