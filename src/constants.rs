//! Compile-time constants reverse-engineered from the game's engine and save
//! format. Kept as byte arrays rather than runtime strings so the signature
//! scanner can be specialized at compile time, per the crate's design notes.

/// The 12-byte header signature of a live scripting-variable node in the
/// engine's hash table. The value DWORD sits at [`LIVE_NODE_VALUE_OFFSET`]
/// bytes past the start of this signature.
pub const LIVE_NODE_SIGNATURE: [u8; 12] = [
    0xA1, 0x5A, 0x21, 0x97, 0x53, 0xC0, 0x0E, 0x51, 0x5C, 0x8F, 0x8D, 0x00,
];

/// Offset from the start of [`LIVE_NODE_SIGNATURE`] to the value DWORD.
pub const LIVE_NODE_VALUE_OFFSET: u32 = 0x0C;

/// The three pointer-sized words preceding the node signature that the
/// locality filter inspects, as offsets (negative, i.e. "bytes before the
/// signature start").
pub const LOCALITY_WORD_OFFSETS: [u32; 3] = [0x10, 0x0C, 0x08];

/// How close a preceding word's value must be to the node's own address to
/// count as "pointing nearby" for locality scoring. Named per the design
/// notes' suggestion to parameterize this rather than inline the literal, in
/// case a future engine variant needs a different radius.
pub const LOCALITY_RADIUS: u32 = 4 * 1024 * 1024;

/// The 16-byte signature that precedes the counter in a decoded (i.e.
/// XOR-0xFF'd) save buffer. The little-endian u32 counter immediately
/// follows it.
pub const SAVE_COUNTER_SIGNATURE: [u8; 16] = [
    0x02, 0x00, 0x00, 0x00, 0xA1, 0x5A, 0x21, 0x97, 0x53, 0xC0, 0x0E, 0x51, 0x00, 0x00, 0x00, 0x00,
];

/// The four raw (pre-decode) bytes every save file must begin with.
pub const SAVE_MAGIC: [u8; 4] = [0xAA, 0xDE, 0xAF, 0x64];

/// The byte every save file byte is XORed with to produce the searchable,
/// decoded buffer.
pub const SAVE_OBFUSCATION_KEY: u8 = 0xFF;

/// The image name of the target process, as supplied by the operator layer.
/// The core itself takes this as a plain `&str` argument; this constant is
/// the one name the operator-facing collaborators are expected to pass.
pub const TARGET_PROCESS_NAME: &str = "monkeyisland103.exe";

/// Large regions are read from the target process in chunks of this size to
/// bound peak memory, per the design notes on region buffer sizing.
pub const SCAN_CHUNK_SIZE: usize = 64 * 1024;
