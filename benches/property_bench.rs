use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use upbridge::driver::UpdateDriver;
use upbridge::io_stream::{data_stream, ByteArrayStream};
use upbridge::{
    ArchiveFormat, ArchiveUpdateCallback, ManagedFault, OutItemFactory, OutItemRecord, PropId,
    PropVariant, UpdateCallback, UpdateCallbackAdapter, UpdateOptions,
};

struct Items {
    data: Vec<u8>,
}

impl UpdateCallback for Items {
    type Item = OutItemRecord;

    fn get_item_information(&mut self, index: u32, factory: OutItemFactory) -> Result<Option<OutItemRecord>, ManagedFault> {
        Ok(Some(
            factory
                .create_out_item()
                .with_path(format!("file_{index}.bin"))
                .with_size(self.data.len() as u64)
                .with_attributes(0x20)
                .with_modification_time(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
                .with_data_stream(data_stream(ByteArrayStream::new(self.data.clone()))),
        ))
    }

    fn set_operation_result(&mut self, _ok: bool) -> Result<(), ManagedFault> {
        Ok(())
    }
}

fn bench_get_property(c: &mut Criterion) {
    let mut adapter = UpdateCallbackAdapter::new(Items { data: Vec::new() }, UpdateOptions::default());
    let props = ArchiveFormat::SevenZip.item_properties();

    c.bench_function("get_property_cached_item", |b| {
        b.iter(|| {
            for &prop in props {
                let mut value = PropVariant::Empty;
                adapter.get_property(0, black_box(prop), Some(&mut value)).unwrap();
                black_box(&value);
            }
        })
    });

    let mut index = 0u32;
    c.bench_function("get_property_new_item", |b| {
        b.iter(|| {
            index = index.wrapping_add(1);
            let mut value = PropVariant::Empty;
            adapter.get_property(index, PropId::PATH, Some(&mut value)).unwrap();
            black_box(value);
        })
    });
}

fn bench_driver_run(c: &mut Criterion) {
    let data = vec![42u8; 1024 * 1024];

    c.bench_function("drive_16x1mb_7z", |b| {
        b.iter(|| {
            let items = Items { data: data.clone() };
            let mut adapter = UpdateCallbackAdapter::new(items, UpdateOptions::default());
            let packed = UpdateDriver::new(ArchiveFormat::SevenZip)
                .run(&mut adapter, 16, 16 * data.len() as u64)
                .unwrap();
            black_box(packed);
        })
    });
}

criterion_group!(benches, bench_get_property, bench_driver_run);
criterion_main!(benches);
