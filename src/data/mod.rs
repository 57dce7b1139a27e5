pub mod pool;
pub mod synthetic;
pub mod idx;

use std::path::PathBuf;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use idx::ImageSet;
pub use pool::DataPool;
pub use synthetic::Ring;

/// Where the real samples come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DataSource {
    /// 2-D ring of Gaussians, `samples` points.
    Ring(Ring),
    /// Flattened images from an IDX3 file.
    Idx { images: PathBuf },
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Ring(Ring::default())
    }
}

/// A loaded pool plus the image geometry, when the samples are images.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub pool: DataPool,
    pub image_size: Option<(usize, usize)>,
}

impl DataSource {
    pub fn load<R: Rng + ?Sized>(&self, samples: usize, rng: &mut R) -> crate::Result<LoadedData> {
        match self {
            DataSource::Ring(ring) => Ok(LoadedData {
                pool: DataPool::new(ring.sample(samples, rng)?)?,
                image_size: None,
            }),
            DataSource::Idx { images } => {
                let set = idx::load_images(images)?;
                tracing::info!(
                    "loaded {} images of {}x{} from {}",
                    set.pixels.rows, set.width, set.height, images.display()
                );
                Ok(LoadedData {
                    pool: DataPool::new(set.pixels)?,
                    image_size: Some((set.width, set.height)),
                })
            }
        }
    }
}
