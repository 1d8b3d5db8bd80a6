use codedupe::detect::{
    decode_key, encode_key, has_duplicates, BitsetMerger, Detection, LineEnding, RecordLayout,
    RecordView, ScanConfig, ScanError, ScanOrchestrator, ScanWorker, WorkDistributor, WorkerState,
    MAX_KEYS,
};

fn crlf_buffer(codes: &[&str]) -> Vec<u8> {
    codes
        .iter()
        .flat_map(|c| format!("{c}\r\n").into_bytes())
        .collect()
}

/// `count` distinct codes spread across the key space.
fn unique_buffer(count: usize) -> Vec<u8> {
    let stride = (MAX_KEYS / count.max(1)).max(1) as u32;
    let mut buffer = Vec::with_capacity(count * 8);
    for i in 0..count as u32 {
        buffer.extend_from_slice(&encode_key(i * stride));
        buffer.extend_from_slice(b"\r\n");
    }
    buffer
}

fn orchestrator(threads: usize, batch_size: usize, threshold: usize) -> ScanOrchestrator {
    ScanOrchestrator::new(
        ScanConfig::default()
            .with_threads(threads)
            .with_batch_size(batch_size)
            .with_single_threaded_threshold(threshold),
    )
    .unwrap()
}

#[test]
fn test_pigeonhole_ignores_buffer() {
    assert!(has_duplicates(&[], MAX_KEYS + 1, 3, 4096, 600_000).unwrap());
    assert!(has_duplicates(&[], 1_000_000_000, 1, 1, 0).unwrap());

    let report = orchestrator(3, 4096, 600_000)
        .scan(&[], MAX_KEYS + 1)
        .unwrap();
    assert_eq!(report.detection, Detection::Pigeonhole);
    assert_eq!(report.threads_used, 0);
    assert_eq!(report.records_scanned, 0);
}

#[test]
fn test_empty_and_single_record() {
    assert!(!has_duplicates(&[], 0, 3, 4096, 600_000).unwrap());
    assert!(!has_duplicates(b"ABC123\r\n", 1, 3, 4096, 600_000).unwrap());
    assert!(!has_duplicates(b"ABC123\r\n", 1, 3, 1, 0).unwrap());
}

#[test]
fn test_repeated_code_detected_on_both_paths() {
    let buffer = crlf_buffer(&["ABC123", "XYZ999", "ABC123"]);
    assert!(has_duplicates(&buffer, 3, 3, 4096, 600_000).unwrap());
    assert!(has_duplicates(&buffer, 3, 3, 1, 0).unwrap());
}

#[test]
fn test_distinct_codes_on_both_paths() {
    let buffer = crlf_buffer(&["ABC123", "ABC124"]);
    assert!(!has_duplicates(&buffer, 2, 3, 4096, 600_000).unwrap());
    assert!(!has_duplicates(&buffer, 2, 3, 1, 0).unwrap());
}

#[test]
fn test_extreme_codes() {
    let buffer = crlf_buffer(&["AAA000", "ZZZ999", "AAA000"]);
    assert!(has_duplicates(&buffer, 3, 2, 1, 0).unwrap());
    assert!(!has_duplicates(&buffer, 2, 2, 1, 0).unwrap());
    assert_eq!(decode_key(b"ZZZ999") as usize, MAX_KEYS - 1);
}

#[test]
fn test_final_record_without_terminator() {
    assert!(has_duplicates(b"ABC123\r\nABC123", 2, 1, 4096, 600_000).unwrap());
    assert!(!has_duplicates(b"ABC123\r\nABC124", 2, 2, 1, 0).unwrap());
}

#[test]
fn test_verdict_independent_of_threads_and_batches() {
    let unique = unique_buffer(10_000);
    let mut repeated = unique.clone();
    repeated.extend_from_slice(&unique[..8]);

    for threads in [1, 2, 3, 4, 8] {
        for batch_size in [1, 7, 4096] {
            let scan = orchestrator(threads, batch_size, 0);
            assert!(
                !scan.scan(&unique, 10_000).unwrap().has_duplicates,
                "false positive with {threads} threads, batch {batch_size}"
            );
            assert!(
                scan.scan(&repeated, 10_001).unwrap().has_duplicates,
                "missed duplicate with {threads} threads, batch {batch_size}"
            );
        }
    }
}

#[test]
fn test_duplicate_split_across_partitions() {
    let buffer = crlf_buffer(&["ABC123", "DEF456", "GHI789", "ABC123"]);
    let records = RecordView::new(&buffer, 4, RecordLayout::default()).unwrap();
    let distributor = WorkDistributor::new(records.len());

    let mut first = ScanWorker::new(0).unwrap();
    let mut second = ScanWorker::new(1).unwrap();

    // Each worker claims one half; neither sees ABC123 twice.
    assert_eq!(first.step(&records, &distributor, 2), WorkerState::Running);
    assert_eq!(second.step(&records, &distributor, 2), WorkerState::Running);
    assert_eq!(first.step(&records, &distributor, 2), WorkerState::Exhausted);
    assert_eq!(second.step(&records, &distributor, 2), WorkerState::Exhausted);

    let key = decode_key(b"ABC123") as usize;
    assert_eq!(
        BitsetMerger::first_shared_word(&[first.bitset(), second.bitset()]),
        Some(key / 64)
    );
}

#[test]
fn test_full_scan_merges_duplicate_split_between_workers() {
    let count = 20_000;
    let mut buffer = unique_buffer(count);
    let first = buffer[..8].to_vec();
    buffer[(count - 1) * 8..].copy_from_slice(&first);
    let key = decode_key(&first) as usize;

    let scan = orchestrator(2, count / 2, 0);
    for _ in 0..20 {
        let report = scan.scan(&buffer, count).unwrap();
        assert!(report.has_duplicates);
        assert_eq!(report.threads_used, 2);
        assert_eq!(report.records_scanned, count);
        match report.workers_active {
            // One batch each: neither worker sees both copies.
            2 => assert_eq!(
                report.detection,
                Detection::AcrossPartitions { word: key / 64 }
            ),
            1 => assert!(matches!(
                report.detection,
                Detection::WithinPartition { .. }
            )),
            n => panic!("unexpected active worker count {n}"),
        }
    }
}

#[test]
fn test_huge_batch_size_has_no_false_positive() {
    let buffer = crlf_buffer(&["AAA000", "AAA001", "AAA002", "AAA003"]);
    for _ in 0..50 {
        assert!(!has_duplicates(&buffer, 4, 3, usize::MAX / 2 + 2, 0).unwrap());
        assert!(!has_duplicates(&buffer, 4, 3, usize::MAX, 0).unwrap());
    }
}

#[test]
fn test_malformed_code_is_a_typed_error() {
    let buffer = b"abc123\r\nABC123\r\n";
    for (threads, threshold) in [(3, 600_000), (3, 0), (1, 0)] {
        let result = has_duplicates(buffer, 2, threads, 4096, threshold);
        assert!(
            matches!(result, Err(ScanError::MalformedRecord { index: 0, .. })),
            "threads {threads}, threshold {threshold}: {result:?}"
        );
    }
}

#[test]
fn test_large_unique_input_on_default_parameters() {
    let count = 1_000_000;
    let buffer = unique_buffer(count);
    let scan = ScanOrchestrator::new(ScanConfig::default()).unwrap();

    let report = scan.scan(&buffer, count).unwrap();
    assert!(!report.has_duplicates);
    assert_eq!(report.detection, Detection::Unique);
    assert_eq!(report.threads_used, 3);
    assert_eq!(report.records_scanned, count);

    let mut repeated = buffer;
    let tail = repeated[(count - 1) * 8..].to_vec();
    repeated.extend_from_slice(&tail);
    assert!(scan.scan(&repeated, count + 1).unwrap().has_duplicates);
}

#[test]
fn test_repeated_scans_start_fresh() {
    let buffer = unique_buffer(5_000);
    let scan = orchestrator(4, 64, 0);
    for _ in 0..3 {
        assert!(!scan.scan(&buffer, 5_000).unwrap().has_duplicates);
    }
}

#[test]
fn test_lf_layout() {
    let buffer = b"ABC123\nXYZ999\nABC123\n";
    let config = ScanConfig::default()
        .with_threads(2)
        .with_batch_size(1)
        .with_single_threaded_threshold(0)
        .with_layout(RecordLayout::new(LineEnding::Lf));
    let report = ScanOrchestrator::new(config).unwrap().scan(buffer, 3).unwrap();
    assert!(report.has_duplicates);
}

#[test]
fn test_buffer_too_short() {
    let result = has_duplicates(b"ABC123\r\n", 2, 1, 4096, 600_000);
    assert!(matches!(
        result,
        Err(ScanError::BufferTooShort {
            required: 14,
            actual: 8
        })
    ));
}

#[test]
fn test_invalid_parameters() {
    assert!(matches!(
        has_duplicates(b"ABC123\r\n", 1, 0, 4096, 600_000),
        Err(ScanError::InvalidConfig(_))
    ));
    assert!(matches!(
        has_duplicates(b"ABC123\r\n", 1, 3, 0, 600_000),
        Err(ScanError::InvalidConfig(_))
    ));
}
