// Three-stage JD-to-CV matching:
// pre-filter (gateway) → similarity batches + scoring → write-back.
// All similarity calls go through llm_client; scoring never calls out.

pub mod gateway;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod scoring;
pub mod similarity;
pub mod skills;

#[cfg(test)]
pub mod test_support;
