//! Framing tests across message families
//!
//! Covers the size rule, envelope rejection, plausibility bounds checked
//! before allocation, and decoding by type tag.

use sensorwire::{
    buffers::BufferPool,
    error::DecodeError,
    messages::{
        image::IMAGE_HEADER_SIZE, point_cloud::POINT_CLOUD_HEADER_SIZE, AnyMessage,
        ColorConversion, Extrinsics, Finding, ImageHeader, MessageInfo, MessageType,
        NavigationData, Obstacle, ObstacleData, OccupancyObstacle, OccupancyObstacleData,
        PixelType, Point, PointCloud, PointCloudRgb, PointCloudSoup, QaFindings, Severity,
        StampedImage, Vec2, VelocityData, WireMessage,
    },
};

fn bgr_image(rows: u32, cols: u32, frame_id: u64, time: u64) -> StampedImage {
    let header = ImageHeader {
        time,
        frame_id,
        rows,
        cols,
        pixel_type: PixelType::CV_8UC3,
        color_conversion: ColorConversion::BGR2BGR,
    };
    let pixels = (0..rows as usize * cols as usize * 3)
        .map(|i| (i % 251) as u8)
        .collect();
    StampedImage::new(header, pixels)
}

fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(bytes: &mut [u8], offset: usize, value: u64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod codec_tests {
    use super::*;

    /// Test: 100x50 BGR image encodes to header + 15000 bytes and back
    #[test]
    fn test_image_concrete_scenario() {
        init_logging();
        let image = bgr_image(100, 50, 42, 1000);
        let bytes = image.to_bytes().unwrap();
        assert_eq!(bytes.len(), IMAGE_HEADER_SIZE + 100 * 50 * 3);

        let decoded = StampedImage::decode(&bytes).unwrap();
        assert_eq!(decoded.header.rows, 100);
        assert_eq!(decoded.header.cols, 50);
        assert_eq!(decoded.header.frame_id, 42);
        assert_eq!(decoded.header.time, 1000);
        assert_eq!(decoded.pixels.len(), 15000);
        assert_eq!(decoded, image);
    }

    /// Test: encoding into a pooled buffer matches the owned encoding
    #[test]
    fn test_encode_parts_matches_owned_encoding() {
        init_logging();
        let pool = BufferPool::with_name("images").unwrap();
        let image = bgr_image(4, 6, 7, 70).with_side_channel(
            Extrinsics {
                euler_x_deg: 1.0,
                euler_y_deg: -2.0,
                euler_z_deg: 0.5,
                tx: 0.1,
                ty: 0.0,
                tz: 1.5,
            }
            .to_side_channel(),
        );

        let mut buffer = pool.acquire();
        let written =
            StampedImage::encode_parts(&mut buffer, &image.header, &image.pixels, &image.side_channel)
                .unwrap();
        assert_eq!(written, buffer.len());
        assert_eq!(buffer.as_slice(), image.to_bytes().unwrap().as_slice());

        let decoded = StampedImage::decode(&buffer).unwrap();
        assert_eq!(decoded.extrinsics().unwrap().tz, 1.5);
    }

    /// Test: pixel payload must match the header exactly
    #[test]
    fn test_image_payload_mismatch_rejected_on_encode() {
        init_logging();
        let mut image = bgr_image(2, 2, 1, 1);
        image.pixels.pop();
        assert!(image.to_bytes().is_err());
    }

    /// Test: major version mismatch is rejected; lossy decode yields empty
    #[test]
    fn test_major_version_rejected() {
        init_logging();
        let mut bytes = bgr_image(2, 2, 1, 1).to_bytes().unwrap();
        bytes[2] = 1;

        assert_eq!(
            StampedImage::decode(&bytes).unwrap_err(),
            DecodeError::MajorVersionMismatch {
                message: "StampedImage",
                expected: 0,
                actual: 1,
            }
        );
        assert!(StampedImage::decode_lossy(&bytes).is_empty());
    }

    /// Test: a buffer of one family is not accepted as another
    #[test]
    fn test_wrong_message_type_rejected() {
        init_logging();
        let cloud = PointCloud {
            time: 1,
            frame_id: 2,
            points: vec![Point::new(1.0, 2.0, 3.0)],
        };
        let bytes = cloud.to_bytes().unwrap();
        assert!(matches!(
            StampedImage::decode(&bytes),
            Err(DecodeError::WrongMessageType { actual: 4, .. })
        ));
    }

    /// Test: implausible dimensions rejected before any allocation
    #[test]
    fn test_implausible_image_rejected() {
        init_logging();
        let mut bytes = bgr_image(2, 2, 1, 1).to_bytes().unwrap();
        put_u32(&mut bytes, 20, 100_000);
        put_u32(&mut bytes, 24, 100_000);

        assert!(matches!(
            StampedImage::decode(&bytes),
            Err(DecodeError::ImplausibleSize { field: "rows*cols", .. })
        ));
    }

    /// Test: unknown element type is reported as such
    #[test]
    fn test_unknown_pixel_type_rejected() {
        init_logging();
        let mut bytes = bgr_image(2, 2, 1, 1).to_bytes().unwrap();
        put_u32(&mut bytes, 28, 7 | (2 << 3) | (1 << 20));
        assert!(StampedImage::decode(&bytes).is_err());
        assert!(StampedImage::decode_lossy(&bytes).is_empty());
    }

    /// Test: short payloads are truncated, long ones violate the size rule
    #[test]
    fn test_size_rule() {
        init_logging();
        let bytes = bgr_image(3, 3, 1, 1).to_bytes().unwrap();

        assert!(matches!(
            StampedImage::decode(&bytes[..bytes.len() - 1]),
            Err(DecodeError::Truncated { .. })
        ));

        let mut long = bytes.clone();
        long.push(0);
        assert!(matches!(
            StampedImage::decode(&long),
            Err(DecodeError::SizeMismatch { .. })
        ));

        // A newer minor version may append fields we do not know
        long[3] = 2;
        let decoded = StampedImage::decode(&long).unwrap();
        assert_eq!(decoded.header.rows, 3);
    }

    /// Test: a point count larger than the supplied bytes is rejected
    #[test]
    fn test_point_count_overclaim_rejected() {
        init_logging();
        let cloud = PointCloud {
            time: 5,
            frame_id: 6,
            points: vec![Point::new(0.0, 1.0, 2.0); 10],
        };
        let mut bytes = cloud.to_bytes().unwrap();
        assert_eq!(bytes.len(), POINT_CLOUD_HEADER_SIZE + 10 * 12);

        put_u64(&mut bytes, 20, 11);
        assert!(matches!(
            PointCloud::decode(&bytes),
            Err(DecodeError::Truncated { .. })
        ));

        put_u64(&mut bytes, 20, u64::MAX);
        assert!(PointCloud::decode(&bytes).is_err());
    }

    /// Test: colored clouds carry colors after the points
    #[test]
    fn test_point_cloud_rgb_roundtrip() {
        init_logging();
        let cloud = PointCloudRgb {
            time: 10,
            frame_id: 11,
            points: vec![Point::new(1.0, 2.0, 3.0), Point::new(4.0, 5.0, 6.0)],
            colors: vec![Point::new(255.0, 0.0, 0.0), Point::new(0.0, 255.0, 0.0)],
        };
        let bytes = cloud.to_bytes().unwrap();
        assert_eq!(bytes.len(), POINT_CLOUD_HEADER_SIZE + 2 * 24);
        assert_eq!(PointCloudRgb::decode(&bytes).unwrap(), cloud);
    }

    /// Test: soup embeds two complete images stamped with its own ids
    #[test]
    fn test_soup_roundtrip() {
        init_logging();
        let mut q = [0.0f32; 16];
        q[0] = 1.0;
        q[15] = 0.25;
        let disparity = StampedImage::new(
            ImageHeader {
                rows: 3,
                cols: 4,
                pixel_type: PixelType::CV_16SC1,
                ..ImageHeader::default()
            },
            vec![0u8; 3 * 4 * 2],
        );
        let soup = PointCloudSoup::new(900, 33, 0.12, 800.0, q, bgr_image(3, 4, 0, 0), disparity);

        let bytes = soup.to_bytes().unwrap();
        let decoded = PointCloudSoup::decode(&bytes).unwrap();
        assert_eq!(decoded.rectified.header.frame_id, 33);
        assert_eq!(decoded.disparity.header.time, 900);
        assert_eq!(decoded.disparity_to_depth[15], 0.25);
        assert_eq!(decoded, soup);
    }

    /// Test: obstacle families, including per-obstacle occupancy cells
    #[test]
    fn test_obstacle_roundtrips() {
        init_logging();
        let obstacle = Obstacle {
            bounding_box: [
                Vec2::new(-1.0, 5.0),
                Vec2::new(1.0, 5.0),
                Vec2::new(1.0, 7.0),
                Vec2::new(-1.0, 7.0),
            ],
            velocity: Vec2::new(0.0, -0.5),
        };
        let data = ObstacleData {
            time: 1,
            frame_id: 2,
            obstacles: vec![obstacle; 3],
        };
        assert_eq!(ObstacleData::decode(&data.to_bytes().unwrap()).unwrap(), data);

        let occupancy = OccupancyObstacleData {
            time: 3,
            frame_id: 4,
            obstacles: vec![
                OccupancyObstacle {
                    obstacle,
                    cells: vec![Vec2::new(0.0, 6.0), Vec2::new(0.5, 6.0)],
                },
                OccupancyObstacle {
                    obstacle,
                    cells: Vec::new(),
                },
            ],
        };
        let decoded = OccupancyObstacleData::decode(&occupancy.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.obstacles[0].cells.len(), 2);
        assert_eq!(decoded, occupancy);
    }

    /// Test: finding strings are truncated to their fixed width
    #[test]
    fn test_qa_findings_truncation() {
        init_logging();
        let long_key = "k".repeat(300);
        let findings = QaFindings {
            time: 7,
            frame_id: 8,
            findings: vec![
                Finding::new("calibration", &long_key, Severity::Warning, "drift", 0.3, "px"),
                Finding::new("exposure", "left", Severity::Error, "saturated", 1.0, "%"),
            ],
        };
        let bytes = findings.to_bytes().unwrap();
        let decoded = QaFindings::decode(&bytes).unwrap();

        assert_eq!(decoded.findings.len(), 2);
        assert_eq!(decoded.findings[0].key.len(), 127);
        assert_eq!(decoded.findings[0].severity, Severity::Warning);
        assert_eq!(decoded.findings[1], findings.findings[1]);
    }

    /// Test: fixed-size families default to identity transforms
    #[test]
    fn test_fixed_size_families() {
        init_logging();
        let mut nav = NavigationData {
            timestamp_ns: 123,
            ..NavigationData::default()
        };
        nav.gps.num_satellites = 11;
        nav.imu.acceleration = [0.0, 0.0, 9.81];
        let bytes = nav.to_bytes().unwrap();
        assert_eq!(bytes.len(), 212);
        let decoded = NavigationData::decode(&bytes).unwrap();
        assert_eq!(decoded.body_to_raw_camera[0], 1.0);
        assert_eq!(decoded, nav);

        let velocity = VelocityData {
            time: 9,
            velocity: [1.0, 0.0, 0.0],
            ..VelocityData::default()
        };
        let bytes = velocity.to_bytes().unwrap();
        assert_eq!(bytes.len(), 60);
        assert_eq!(VelocityData::decode(&bytes).unwrap(), velocity);
    }

    /// Test: decoding by type tag
    #[test]
    fn test_any_message_dispatch() {
        init_logging();
        let bytes = bgr_image(2, 3, 12, 0).to_bytes().unwrap();
        let message = AnyMessage::decode(&bytes).unwrap();
        assert_eq!(message.kind(), MessageType::StampedImage);
        assert_eq!(message.frame_id(), Some(12));
        assert!(message.summary().contains("frame 12"));

        let mut unknown = bytes.clone();
        unknown[..4].copy_from_slice(&MessageInfo::new(99).to_bytes());
        assert_eq!(
            AnyMessage::decode(&unknown).unwrap_err(),
            DecodeError::UnknownMessageType(99)
        );

        assert!(matches!(
            AnyMessage::decode(&[0, 0]),
            Err(DecodeError::Truncated { .. })
        ));
    }
}
