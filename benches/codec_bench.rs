use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sensorwire::{
    buffers::BufferPool,
    messages::{
        ColorConversion, ImageHeader, PixelType, Point, PointCloud, StampedImage, WireMessage,
    },
};

fn image(rows: u32, cols: u32) -> StampedImage {
    let header = ImageHeader {
        time: 1,
        frame_id: 1,
        rows,
        cols,
        pixel_type: PixelType::CV_8UC3,
        color_conversion: ColorConversion::BGR2BGR,
    };
    StampedImage::new(header, vec![127u8; rows as usize * cols as usize * 3])
}

fn benchmark_image(c: &mut Criterion) {
    let mut group = c.benchmark_group("StampedImage");

    for (rows, cols) in [(480u32, 640u32), (1080, 1920), (2160, 3840)].iter() {
        let image = image(*rows, *cols);
        let label = format!("{}x{}", cols, rows);
        group.throughput(Throughput::Bytes(image.encoded_len() as u64));

        let pool = BufferPool::with_name("bench").unwrap();
        group.bench_with_input(BenchmarkId::new("encode_pooled", &label), &image, |b, image| {
            b.iter(|| {
                let mut buffer = pool.acquire();
                StampedImage::encode_parts(
                    &mut buffer,
                    &image.header,
                    &image.pixels,
                    &image.side_channel,
                )
                .unwrap()
            });
        });

        let bytes = image.to_bytes().unwrap();
        group.bench_with_input(BenchmarkId::new("decode", &label), &bytes, |b, bytes| {
            b.iter(|| StampedImage::decode(bytes).unwrap());
        });
    }

    group.finish();
}

fn benchmark_point_cloud(c: &mut Criterion) {
    let mut group = c.benchmark_group("PointCloud");

    for count in [1_000usize, 100_000].iter() {
        let cloud = PointCloud {
            time: 1,
            frame_id: 1,
            points: (0..*count)
                .map(|i| Point::new(i as f32, 0.5, -(i as f32)))
                .collect(),
        };
        let bytes = cloud.to_bytes().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", count), &cloud, |b, cloud| {
            b.iter(|| cloud.to_bytes().unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decode", count), &bytes, |b, bytes| {
            b.iter(|| PointCloud::decode(bytes).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_image, benchmark_point_cloud);
criterion_main!(benches);
