use criterion::{Criterion, black_box};
use spark_mbuf::{MbufPool, PoolConfig};
use std::{env, time::Duration};

/// 链往返基准：追加 1 KiB、前置 40 字节协议头、读回并释放。
///
/// # 设计背景（Why）
/// - 收发路径上最常见的组合是“追加载荷 → 前置协议头 → 线性化读出”，
///   基准覆盖跨缓冲复制与链头迁移两类成本，便于发现链操作的回归。
///
/// # 逻辑解析（How）
/// - 池按 128 字节数据区配置，1 KiB 载荷跨越 9 个缓冲；
/// - 每轮结束释放整条链，保证池状态在迭代之间一致。
fn bench_chain_roundtrip(c: &mut Criterion) {
    let pool = MbufPool::with_mempool(&PoolConfig::with_data_capacity(128, 64))
        .expect("构造池失败");
    let payload = [0xA5u8; 1024];
    let header = [0x45u8; 40];

    c.bench_function("chain_roundtrip", |b| {
        b.iter(|| {
            let mut packet = pool.acquire_with_header(0).expect("取缓冲失败");
            packet.append(black_box(&payload)).expect("追加失败");
            let mut packet = packet.prepend(header.len()).expect("前置失败");
            packet.copy_in(0, &header).expect("写入失败");

            let mut sink = vec![0u8; packet.chain_len()];
            packet.copy_out(0, &mut sink).expect("读回失败");
            packet.free_chain().expect("释放失败");
            black_box(sink)
        });
    });

    c.bench_function("chain_duplicate", |b| {
        let mut packet = pool.acquire_with_header(0).expect("取缓冲失败");
        packet.append(&payload).expect("追加失败");
        b.iter(|| {
            let copy = packet.duplicate().expect("复制失败");
            black_box(copy.chain_len());
            copy.free_chain().expect("释放失败");
        });
        packet.free_chain().expect("释放失败");
    });
}

fn main() {
    let mut quick_mode = false;
    for arg in env::args().skip(1) {
        if arg == "--quick" {
            quick_mode = true;
        }
    }

    let mut criterion = Criterion::default();
    if quick_mode {
        criterion = criterion
            .sample_size(10)
            .warm_up_time(Duration::from_millis(100))
            .measurement_time(Duration::from_millis(250));
    }

    bench_chain_roundtrip(&mut criterion);
    criterion.final_summary();
}
