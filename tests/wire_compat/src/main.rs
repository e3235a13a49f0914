fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use filedrop_client::{ClientConfig, FileClient};
    use filedrop_data_channel::TransferError;
    use filedrop_protocol::constants::CHUNK_SIZE;
    use filedrop_protocol::{Command, Status};
    use filedrop_server::{FileServer, ServerConfig};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    /// A running server plus a client pointed at it.
    struct Harness {
        server: Arc<FileServer>,
        handle: JoinHandle<Result<(), TransferError>>,
        addr: SocketAddr,
        client: FileClient,
        storage_dir: tempfile::TempDir,
        download_dir: tempfile::TempDir,
    }

    impl Harness {
        async fn start() -> Self {
            let storage_dir = tempfile::tempdir().unwrap();
            let root = storage_dir.path().to_path_buf();
            Self::start_with_root(storage_dir, root).await
        }

        /// Starts a server whose storage root is a regular file, so every
        /// attempt to store or open a file fails locally on the server.
        async fn start_with_unusable_storage() -> Self {
            let storage_dir = tempfile::tempdir().unwrap();
            let root = storage_dir.path().join("plain-file");
            std::fs::write(&root, b"").unwrap();
            Self::start_with_root(storage_dir, root).await
        }

        async fn start_with_root(storage_dir: tempfile::TempDir, root: PathBuf) -> Self {
            let download_dir = tempfile::tempdir().unwrap();

            let server = Arc::new(FileServer::new(ServerConfig {
                port: 0,
                storage_dir: root,
            }));
            let listener = server.bind().await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let addr: SocketAddr = ([127, 0, 0, 1], port).into();

            let run_server = Arc::clone(&server);
            let handle = tokio::spawn(async move { run_server.run(listener).await });

            let client = FileClient::new(ClientConfig {
                server_addr: addr.to_string(),
                download_dir: download_dir.path().to_path_buf(),
                ..ClientConfig::default()
            });

            Self {
                server,
                handle,
                addr,
                client,
                storage_dir,
                download_dir,
            }
        }

        /// Writes a local file for upload and returns its path.
        fn local_file(&self, name: &str, data: &[u8]) -> PathBuf {
            let source_dir = self.download_dir.path().join("source");
            std::fs::create_dir_all(&source_dir).unwrap();
            let path = source_dir.join(name);
            std::fs::write(&path, data).unwrap();
            path
        }

        /// Names currently stored by the server.
        fn stored_names(&self) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(self.storage_dir.path())
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect();
            names.sort();
            names
        }

        /// Uploads `data` as `name` and returns the name the server stored it under.
        async fn upload(&self, name: &str, data: &[u8]) -> String {
            let before = self.stored_names();
            let path = self.local_file(name, data);
            let bytes = self.client.upload(&path).await.unwrap();
            assert_eq!(bytes, data.len() as u64);

            let mut added: Vec<String> = self
                .stored_names()
                .into_iter()
                .filter(|n| !before.contains(n))
                .collect();
            assert_eq!(added.len(), 1, "expected exactly one new stored file");
            added.remove(0)
        }

        /// Sends raw request bytes, half-closes, and returns the raw response.
        async fn raw_exchange(&self, request: &[u8]) -> Vec<u8> {
            let mut stream = TcpStream::connect(self.addr).await.unwrap();
            stream.write_all(request).await.unwrap();
            stream.shutdown().await.unwrap();
            let mut response = Vec::new();
            let _ = stream.read_to_end(&mut response).await;
            response
        }

        async fn stop(self) {
            self.server.shutdown();
            self.handle.await.unwrap().unwrap();
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 256) as u8).collect()
    }

    fn assert_stored_name(stored: &str, client_name: &str) {
        let (id, rest) = stored
            .split_once(' ')
            .unwrap_or_else(|| panic!("stored name has no id prefix: {stored:?}"));
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(rest, client_name);
    }

    // --- Round trips through the real client ---

    #[tokio::test]
    async fn hello_upload_then_download() {
        let h = Harness::start().await;

        let stored = h.upload("a.txt", b"hello").await;
        assert_stored_name(&stored, "a.txt");

        let download = h.client.download(&stored).await.unwrap();
        assert_eq!(
            download.path,
            h.download_dir.path().join(format!("down_{stored}"))
        );
        assert_eq!(download.bytes, 5);
        assert_eq!(std::fs::read(&download.path).unwrap(), b"hello");

        h.stop().await;
    }

    #[tokio::test]
    async fn roundtrip_is_byte_identical() {
        let h = Harness::start().await;
        let data = pattern(256 * 1024 + 3);

        let stored = h.upload("blob.bin", &data).await;
        let download = h.client.download(&stored).await.unwrap();
        assert_eq!(std::fs::read(&download.path).unwrap(), data);

        h.stop().await;
    }

    #[tokio::test]
    async fn zero_byte_file() {
        let h = Harness::start().await;

        let stored = h.upload("empty.txt", b"").await;
        assert!(
            std::fs::read(h.storage_dir.path().join(&stored))
                .unwrap()
                .is_empty()
        );

        let download = h.client.download(&stored).await.unwrap();
        assert_eq!(download.bytes, 0);
        assert!(download.path.exists());
        assert!(std::fs::read(&download.path).unwrap().is_empty());

        h.stop().await;
    }

    #[tokio::test]
    async fn exact_chunk_multiple() {
        let h = Harness::start().await;

        for chunks in [1, 2, 64] {
            let data = pattern(CHUNK_SIZE * chunks);
            let stored = h.upload(&format!("chunks_{chunks}.bin"), &data).await;
            let download = h.client.download(&stored).await.unwrap();
            assert_eq!(download.bytes, data.len() as u64);
            assert_eq!(std::fs::read(&download.path).unwrap(), data);
        }

        h.stop().await;
    }

    #[tokio::test]
    async fn repeated_download_is_idempotent() {
        let h = Harness::start().await;
        let data = pattern(5000);
        let stored = h.upload("same.bin", &data).await;

        for _ in 0..3 {
            let download = h.client.download(&stored).await.unwrap();
            assert_eq!(std::fs::read(&download.path).unwrap(), data);
        }
        assert_eq!(
            std::fs::read(h.storage_dir.path().join(&stored)).unwrap(),
            data
        );
        assert_eq!(h.stored_names(), vec![stored]);

        h.stop().await;
    }

    #[tokio::test]
    async fn same_name_twice_keeps_both() {
        let h = Harness::start().await;

        let first = h.upload("dup.txt", b"first").await;
        let second = h.upload("dup.txt", b"second").await;
        assert_ne!(first, second);
        assert_eq!(h.stored_names().len(), 2);

        h.stop().await;
    }

    #[tokio::test]
    async fn unicode_name_with_spaces() {
        let h = Harness::start().await;

        let stored = h.upload("báo cáo cuối kỳ.txt", b"content").await;
        assert_stored_name(&stored, "báo cáo cuối kỳ.txt");
        let download = h.client.download(&stored).await.unwrap();
        assert_eq!(std::fs::read(&download.path).unwrap(), b"content");

        h.stop().await;
    }

    #[tokio::test]
    async fn missing_file_reports_not_found() {
        let h = Harness::start().await;

        let result = h.client.download("never-uploaded.txt").await;
        assert!(matches!(result, Err(TransferError::FileNotFound(_))));
        assert!(!h.download_dir.path().join("down_never-uploaded.txt").exists());

        h.stop().await;
    }

    #[tokio::test]
    async fn path_name_reports_invalid() {
        let h = Harness::start().await;

        let result = h.client.download("../outside.txt").await;
        assert!(matches!(result, Err(TransferError::InvalidName(_))));

        h.stop().await;
    }

    // --- Uploads the server refuses ---

    #[cfg(unix)]
    #[tokio::test]
    async fn backslash_name_rejected_by_server() {
        let h = Harness::start().await;
        let path = h.local_file("a\\b.txt", &pattern(CHUNK_SIZE * 32));

        let result = h.client.upload(&path).await;
        assert!(
            matches!(result, Err(TransferError::InvalidName(ref name)) if name == "a\\b.txt"),
            "{result:?}"
        );
        assert!(h.stored_names().is_empty());

        let stored = h.upload("fine.txt", b"fine").await;
        assert_stored_name(&stored, "fine.txt");

        h.stop().await;
    }

    #[tokio::test]
    async fn unusable_storage_fails_upload() {
        let h = Harness::start_with_unusable_storage().await;
        let path = h.local_file("a.txt", b"hello");

        for _ in 0..2 {
            let result = h.client.upload(&path).await;
            assert!(
                matches!(result, Err(TransferError::ServerFailed(ref name)) if name == "a.txt"),
                "{result:?}"
            );
        }

        let result = h.client.download("a.txt").await;
        assert!(matches!(result, Err(TransferError::ServerFailed(_))));
        assert!(!h.download_dir.path().join("down_a.txt").exists());

        h.stop().await;
    }

    #[tokio::test]
    async fn path_download_rejected_before_connecting() {
        let h = Harness::start().await;
        std::fs::write(h.download_dir.path().join("y"), b"keep").unwrap();

        let result = h.client.download("x/../../y").await;
        assert!(matches!(result, Err(TransferError::InvalidName(_))));
        assert_eq!(
            std::fs::read(h.download_dir.path().join("y")).unwrap(),
            b"keep"
        );

        h.stop().await;
    }

    // --- Raw wire layout, as a reference peer would speak it ---

    #[tokio::test]
    async fn reference_upload_layout() {
        let h = Harness::start().await;

        let mut request = vec![Command::Upload.code()];
        request.extend_from_slice(b"a.txt\0hello");
        let response = h.raw_exchange(&request).await;
        assert_eq!(response, [Status::Ok.code()]);

        let stored = h.stored_names();
        assert_eq!(stored.len(), 1);
        assert_stored_name(&stored[0], "a.txt");
        assert_eq!(
            std::fs::read(h.storage_dir.path().join(&stored[0])).unwrap(),
            b"hello"
        );

        h.stop().await;
    }

    #[tokio::test]
    async fn reference_download_layout() {
        let h = Harness::start().await;
        std::fs::write(h.storage_dir.path().join("plain.txt"), b"abc").unwrap();

        let response = h.raw_exchange(b"\x01plain.txt\0").await;
        assert_eq!(response, [&[Status::Ok.code()][..], &b"abc"[..]].concat());

        let response = h.raw_exchange(b"\x01absent.txt\0").await;
        assert_eq!(response, [Status::NotFound.code()]);

        h.stop().await;
    }

    #[tokio::test]
    async fn unknown_command_does_not_stop_server() {
        let h = Harness::start().await;

        for code in [0x02u8, 0x7F, 0xFF] {
            let response = h.raw_exchange(&[code]).await;
            assert!(response.is_empty());
        }

        let stored = h.upload("after.txt", b"still here").await;
        assert_stored_name(&stored, "after.txt");

        h.stop().await;
    }

    #[tokio::test]
    async fn truncated_header_does_not_stop_server() {
        let h = Harness::start().await;

        h.raw_exchange(b"\x00no-terminator").await;
        h.raw_exchange(b"").await;
        assert!(h.stored_names().is_empty());

        let stored = h.upload("ok.txt", b"ok").await;
        assert_stored_name(&stored, "ok.txt");

        h.stop().await;
    }

    #[tokio::test]
    async fn local_source_dir_is_not_uploaded() {
        let h = Harness::start().await;
        let result = h.client.upload(Path::new("/")).await;
        assert!(matches!(result, Err(TransferError::MalformedName(_))));
        h.stop().await;
    }
}
