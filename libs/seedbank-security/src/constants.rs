/// Subject id recorded for actions taken by an unauthenticated caller,
/// e.g. licence acceptance on a portal running without login.
pub const ANONYMOUS_SUBJECT_ID: i64 = -1;
