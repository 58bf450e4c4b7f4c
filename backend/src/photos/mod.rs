//! Upload-URL issuing and photo listing on top of an [`ObjectStore`]
mod listing;
pub mod metadata;
mod upload;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use crate::photo_storage::{BucketError, BucketResult, ObjectStore, StoredObject};

pub use listing::{Photo, PhotoListing};
pub use metadata::{PhotoMetadata, UploadMetadata};
pub use upload::{object_key, UploadTicket, PHOTO_PREFIX};

/// Default lifetime of presigned upload URLs
pub const DEFAULT_UPLOAD_URL_EXPIRY_SECS: u64 = 60;
/// Default lifetime of presigned download URLs
pub const DEFAULT_DOWNLOAD_URL_EXPIRY_SECS: u64 = 60 * 60;

/// Stateless photo operations backed by an object store
pub struct PhotoService {
    store: Arc<dyn ObjectStore>,
    upload_url_expiry: Duration,
    download_url_expiry: Duration,
}

impl PhotoService {
    /// Creates a new photo service
    ///
    /// # Arguments
    ///
    /// * `store` - Object store holding the photos
    /// * `upload_url_expiry_secs` - Lifetime of presigned PUT URLs
    /// * `download_url_expiry_secs` - Lifetime of presigned GET URLs
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        upload_url_expiry_secs: u64,
        download_url_expiry_secs: u64,
    ) -> Self {
        Self {
            store,
            upload_url_expiry: Duration::from_secs(upload_url_expiry_secs),
            download_url_expiry: Duration::from_secs(download_url_expiry_secs),
        }
    }

    /// Issues a presigned PUT URL for a new photo.
    ///
    /// Nothing is written to the store; the object only exists once the client
    /// performs the PUT with the returned headers.
    ///
    /// # Errors
    ///
    /// Returns the store error if presigning fails
    pub async fn request_upload_url(
        &self,
        filename: &str,
        content_type: &str,
        metadata: &UploadMetadata,
    ) -> BucketResult<UploadTicket> {
        self.request_upload_url_at(Utc::now(), filename, content_type, metadata)
            .await
    }

    /// Same as [`Self::request_upload_url`] with an explicit upload instant.
    ///
    /// # Errors
    ///
    /// Returns the store error if presigning fails
    pub async fn request_upload_url_at(
        &self,
        uploaded_at: DateTime<Utc>,
        filename: &str,
        content_type: &str,
        metadata: &UploadMetadata,
    ) -> BucketResult<UploadTicket> {
        let key = object_key(uploaded_at.timestamp_millis(), filename);
        let metadata = PhotoMetadata::encode(metadata, uploaded_at);

        let upload_url = self
            .store
            .presign_put(
                &key,
                content_type,
                &metadata.entries(),
                self.upload_url_expiry,
            )
            .await?;

        Ok(UploadTicket {
            upload_url,
            key,
            headers: metadata.upload_headers(content_type),
        })
    }

    /// Lists every photo with its metadata and a presigned GET URL.
    ///
    /// Objects are described concurrently. An object whose metadata or URL
    /// cannot be fetched is left out and counted in [`PhotoListing::dropped`].
    ///
    /// # Errors
    ///
    /// Returns the store error only if the listing itself fails
    pub async fn list_photos(&self) -> BucketResult<PhotoListing> {
        let objects = self.store.list_objects(PHOTO_PREFIX).await?;
        let listed = objects.len();

        let described = join_all(objects.into_iter().map(|object| self.describe(object))).await;

        let mut listing = PhotoListing::default();
        for outcome in described {
            match outcome {
                Ok(photo) => listing.photos.push(photo),
                Err((key, error)) => {
                    warn!(key = %key, error = %error, "Dropping photo from listing");
                    listing.dropped += 1;
                }
            }
        }

        if listing.dropped > 0 {
            warn!(
                listed,
                returned = listing.photos.len(),
                dropped = listing.dropped,
                "Photo listing is incomplete"
            );
        } else {
            info!(listed, "Listed photos");
        }

        Ok(listing)
    }

    async fn describe(
        &self,
        object: StoredObject,
    ) -> Result<Photo, (String, BucketError)> {
        let fetched = tokio::try_join!(
            self.store.object_metadata(&object.key),
            self.store.presign_get(&object.key, self.download_url_expiry),
        );

        match fetched {
            Ok((metadata, url)) => Ok(Photo {
                last_modified: object
                    .last_modified
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
                metadata: metadata.into_iter().collect(),
                size: object.size,
                key: object.key,
                url,
            }),
            Err(error) => Err((object.key, error)),
        }
    }
}
