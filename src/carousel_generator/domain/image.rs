use bytes::Bytes;

/// Raw bytes of a downloaded background and the content type it was served (or sniffed) as.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    pub data: Bytes,
    pub content_type: String,
}

impl FetchedImage {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
