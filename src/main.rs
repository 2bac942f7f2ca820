use core::mem::MaybeUninit;

use utl_common::{
    collections::*,
    sync::MtUtlArray,
};
use utl_logging::{log_info, log_error, LogCategory, LogLevel, Logger, set_logger, get_logger};

pub const LOG_CAT : LogCategory = LogCategory::new("Main");

static LOGGER: Logger = Logger::new();

fn setup_logging() {
    set_logger(&LOGGER);

    let logger = get_logger();
    logger.set_max_level(LogLevel::Verbose);
    logger.set_log_to_console(true);

    match std::fs::File::create("log.txt") {
        Ok(file) => {
            _ = logger.add_writer(Box::new(file));
        },
        Err(err) => {
            log_error!(LOG_CAT, "Failed to create log file: {err}");
        },
    }
}

fn report<T, B: ArrayBuffer<T>>(name: &str, arr: &GenericUtlArray<T, B>) where
    T : core::fmt::Debug
{
    log_info!(LOG_CAT, "{name}: {arr:?} ({})", arr.diagnostics());
}

fn main() {
    setup_logging();

    let mut arr = UtlArray::new();
    arr.add_to_tail(5);
    arr.add_to_tail(7);
    arr.add_to_tail(3);
    arr.insert_before(1, 9);
    report("UtlArray", &arr);

    let mut fixed = FixedUtlArray::<u32, 4>::new();
    fixed.add_multiple_to_tail_from(&[1, 2, 3, 4]);
    if let Err(err) = fixed.try_add_to_tail(5) {
        log_info!(LOG_CAT, "FixedUtlArray rejected a 5th element: {err}");
    }
    report("FixedUtlArray", &fixed);

    let mut small = FixedGrowableUtlArray::<u32, 2>::new();
    small.add_multiple_to_tail_from(&[1, 2, 3]);
    report("FixedGrowableUtlArray", &small);
    small.remove(2);
    small.compact();
    report("FixedGrowableUtlArray (compacted)", &small);

    let mut block = BlockUtlArray::with_grow_size(4, 0);
    for i in (0..10).rev() {
        block.add_to_tail(i);
    }
    block.sort();
    report("BlockUtlArray", &block);

    let mut mem = [MaybeUninit::<u32>::uninit(); 3];
    let mut external = ExternalUtlArray::from_memory(&mut mem);
    external.add_multiple_to_tail_from(&[7, 8, 9]);
    report("ExternalUtlArray", &external);
    drop(external);

    let mut copyable = CopyableUtlArray::new();
    copyable.add_vector_to_tail(&arr);
    let copy = copyable.clone();
    report("CopyableUtlArray (clone)", &copy);

    let shared = MtUtlArray::new(UtlArray::new());
    std::thread::scope(|s| {
        for t in 0..4u32 {
            let shared = &shared;
            s.spawn(move || shared.lock().add_to_tail(t));
        }
    });
    let mut shared = shared.into_inner();
    shared.sort();
    report("MtUtlArray", &shared);

    LOGGER.flush();
}
