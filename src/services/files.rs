//! Opening regular files and streaming their bytes in fixed-size chunks.
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use actix_files::file_extension_to_mime;
use actix_web::mime::{self, Mime};
use actix_web::web::{self, Bytes};
use futures_util::Stream;
use futures_util::stream;

use crate::services::{ServiceError, ServiceResult};

const CHUNK_SIZE: usize = 64 * 1024;

/// Best-effort content type from the file extension.
pub fn content_type_for(path: &Path) -> Mime {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(file_extension_to_mime)
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

/// A regular file opened for download.
#[derive(Debug)]
pub struct OpenedFile {
    file: File,
    len: u64,
    content_type: Mime,
}

impl OpenedFile {
    pub fn open(path: &Path) -> ServiceResult<Self> {
        let file = File::open(path).map_err(ServiceError::OpenFile)?;
        let len = file.metadata().map_err(ServiceError::ReadMetadata)?.len();

        Ok(Self {
            file,
            len,
            content_type: content_type_for(path),
        })
    }

    /// Byte length taken when the file was opened.
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    /// Chunked body; each read runs on the blocking pool.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, io::Error>> + 'static {
        stream::try_unfold(self.file, |mut file| async move {
            let (file, chunk) = web::block(move || {
                let mut buf = vec![0u8; CHUNK_SIZE];
                let read = file.read(&mut buf)?;
                buf.truncate(read);
                Ok::<_, io::Error>((file, buf))
            })
            .await
            .map_err(|_| io::Error::other("blocking read was cancelled"))??;

            if chunk.is_empty() {
                Ok::<_, io::Error>(None)
            } else {
                Ok(Some((Bytes::from(chunk), file)))
            }
        })
    }
}
