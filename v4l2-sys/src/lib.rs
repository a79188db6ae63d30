//! Raw bindings to the video4linux2 UAPI header (`linux/videodev2.h`).

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/v4l2_bindings.rs"));
