// Job corpus: read-only access to the `jobs` table plus the listing endpoints.

pub mod corpus;
pub mod handlers;
