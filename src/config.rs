/// Construction parameters for a [`Heap`](crate::Heap).
///
/// # Example
///
/// ```
/// use rheap::{Heap, HeapConfig};
///
/// let config = HeapConfig::builder()
///   .capacity(4096)
///   .label("scratch")
///   .build();
///
/// let heap = Heap::with_config(&config).unwrap();
/// assert_eq!(heap.capacity(), 4096);
/// assert_eq!(heap.label(), Some("scratch"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapConfig {
  /// Requested arena size in bytes, rounded up to the word size on creation.
  pub capacity: u32,
  /// Optional name shown in diagnostics.
  pub label: Option<String>,
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self {
      capacity: 64 * 1024, // 64 KiB
      label: None,
    }
  }
}

impl HeapConfig {
  pub fn builder() -> HeapConfigBuilder {
    HeapConfigBuilder::default()
  }
}

#[derive(Debug, Default)]
pub struct HeapConfigBuilder {
  config: HeapConfig,
}

impl HeapConfigBuilder {
  pub fn capacity(
    mut self,
    capacity: u32,
  ) -> Self {
    self.config.capacity = capacity;
    self
  }

  pub fn label(
    mut self,
    label: impl Into<String>,
  ) -> Self {
    self.config.label = Some(label.into());
    self
  }

  pub fn build(self) -> HeapConfig {
    self.config
  }
}
