use chrono::{DateTime, Utc};
use da_interface::{make_id, Blob, Namespace, ID};
use sha2::Digest;

// 2023-01-01T00:00:00Z
const GENESIS_TIMESTAMP: i64 = 1672531200;

#[derive(Debug, Clone)]
pub(crate) struct StoredBlob {
    pub(crate) namespace: Namespace,
    pub(crate) id: ID,
    pub(crate) data: Blob,
}

#[derive(Debug, Clone)]
pub(crate) struct MockBlock {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) blobs: Vec<StoredBlob>,
}

/// In memory chain of DA blocks. One block is produced per submission.
#[derive(Debug, Default)]
pub(crate) struct BlockStore {
    blocks: Vec<MockBlock>,
}

impl BlockStore {
    /// Height of the last block, 0 before the first submission.
    pub(crate) fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// Block at `height`, starting at 1.
    pub(crate) fn get(&self, height: u64) -> Option<&MockBlock> {
        let index = height.checked_sub(1)?;
        self.blocks.get(index as usize)
    }

    /// Appends a block holding `blobs` under `namespace` and returns their ids.
    pub(crate) fn push_block(&mut self, namespace: Namespace, blobs: &[Blob]) -> Vec<ID> {
        let height = self.height() + 1;
        let timestamp =
            DateTime::from_timestamp(GENESIS_TIMESTAMP + height as i64, 0).unwrap_or_default();

        let blobs: Vec<StoredBlob> = blobs
            .iter()
            .map(|data| StoredBlob {
                namespace,
                id: make_id(height, &commitment(data)),
                data: data.clone(),
            })
            .collect();
        let ids = blobs.iter().map(|blob| blob.id.clone()).collect();

        self.blocks.push(MockBlock { timestamp, blobs });
        ids
    }

    /// Finds the blob with the given id, only if it was posted under `namespace`.
    pub(crate) fn find(&self, height: u64, id: &[u8], namespace: &Namespace) -> Option<&StoredBlob> {
        self.get(height)?
            .blobs
            .iter()
            .find(|blob| &blob.namespace == namespace && blob.id == id)
    }
}

pub(crate) fn commitment(blob: &[u8]) -> Vec<u8> {
    sha2::Sha256::digest(blob).to_vec()
}
