use neabi_portal::{
    error::AppError,
    storage::{MockStorageService, S3StorageClient, StorageService, image_key, sanitize_key},
};

#[cfg(test)]
mod key_tests {
    use super::*;

    #[test]
    fn test_sanitize_key_drops_traversal() {
        assert_eq!(sanitize_key("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_key("posts//./capa.png"), "posts/capa.png");
        assert_eq!(sanitize_key(".."), "");
    }

    #[test]
    fn test_image_key_layout() {
        let key = image_key("events", "cartaz final.png", "image/png").unwrap();
        assert!(key.starts_with("events/"));
        assert!(key.ends_with("-cartaz final.png"));

        let nested = image_key("posts", "../fotos/capa.jpg", "image/jpeg").unwrap();
        assert!(nested.ends_with("-fotos_capa.jpg"));
        assert!(!nested.contains(".."));
    }

    #[test]
    fn test_image_key_rejections() {
        assert!(matches!(
            image_key("posts", "relatorio.pdf", "application/pdf"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            image_key("videos", "capa.png", "image/png"),
            Err(AppError::Validation(_))
        ));
        assert!(image_key("posts", "../..", "image/png").is_err());
    }
}

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let url = mock
            .get_presigned_upload_url("posts/abc-capa.png", "image/png")
            .await
            .unwrap();

        assert!(url.contains("signature=fake"));
        assert!(url.contains("posts/abc-capa.png"));
        assert!(mock.ensure_bucket_exists().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.get_presigned_upload_url("posts/capa.png", "image/png").await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        let url = mock
            .get_presigned_upload_url("../../etc/passwd", "image/png")
            .await
            .unwrap();
        assert!(!url.contains(".."));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_presigned_url_format() {
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "neabi-test",
        )
        .await;

        let key = image_key("posts", "capa.png", "image/png").unwrap();
        let url = client
            .get_presigned_upload_url(&key, "image/png")
            .await
            .unwrap();

        // Presigning is local; no request reaches the endpoint.
        assert!(url.starts_with("http://localhost:9000/neabi-test/"));
        assert!(url.contains(&key));
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-Expires=600"));
    }
}
