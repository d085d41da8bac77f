//! Process exit codes.
//! These codes are part of the public contract; scripts branch on them.

pub const SUCCESS: i32 = 0;
pub const COMMAND_FAILED: i32 = 1; // Server rejected the request or the command could not complete
pub const CONFIG_ERROR: i32 = 2; // Bad configuration or unreadable session file
pub const UNAUTHORIZED: i32 = 3; // Not logged in, or the session was rejected
pub const UPLOAD_REJECTED: i32 = 4; // File refused before upload
pub const NETWORK_ERROR: i32 = 5; // Transport failure or rate limit
