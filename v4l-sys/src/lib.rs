//! Raw bindings to libv4l2, the userspace wrapper around the video4linux2 UAPI.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/libv4l_bindings.rs"));
