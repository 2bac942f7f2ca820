pub(crate) mod utl_array;
