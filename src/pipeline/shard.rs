//! Deterministic patient partitioning for distributed runs.

use super::extraction::ExtractionError;

/// Select shard `shard_id` of `total_shards` from `patient_ids`.
///
/// Ids are sorted, then split into `total_shards` contiguous parts whose
/// sizes differ by at most one; the first `len % total_shards` parts get
/// the extra id. An empty selected part is an error so that the caller
/// exits without writing output.
pub fn select_shard(
    patient_ids: &[String],
    total_shards: usize,
    shard_id: usize,
) -> Result<Vec<String>, ExtractionError> {
    if total_shards == 0 {
        return Err(ExtractionError::Config("total shards must be at least 1".into()));
    }
    if shard_id >= total_shards {
        return Err(ExtractionError::Config(format!(
            "shard id ({shard_id}) must be less than total shards ({total_shards})"
        )));
    }

    let mut sorted = patient_ids.to_vec();
    sorted.sort();
    sorted.dedup();

    let base = sorted.len() / total_shards;
    let extra = sorted.len() % total_shards;
    let start = shard_id * base + shard_id.min(extra);
    let len = base + usize::from(shard_id < extra);
    let shard: Vec<String> = sorted[start..start + len].to_vec();

    if shard.is_empty() {
        return Err(ExtractionError::EmptyPartition {
            shard_id,
            total_shards,
        });
    }

    tracing::info!(
        shard_id,
        total_shards,
        patients = shard.len(),
        total_patients = sorted.len(),
        "Selected shard"
    );
    Ok(shard)
}
