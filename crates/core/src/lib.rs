pub mod shared {
    pub mod bounding_box;
    pub mod cancellation;
    pub mod constants;
    pub mod dispatch_error;
    pub mod frame;
    pub mod poll;
    pub mod request_mode;
}

pub mod codec {
    pub mod assignment_codec;
    pub mod boxes_codec;
    pub mod codec_error;
    pub mod embedding_codec;
    pub mod frame_codec;
    pub mod identify_codec;
}

pub mod broker {
    pub mod domain {
        pub mod broker;
    }
    pub mod infrastructure;
}

pub mod relay {
    pub mod frame_relay;
}

pub mod identity {
    pub mod domain {
        pub mod identity_store;
    }
    pub mod infrastructure;
}

pub mod session {
    pub mod client_config;
    pub mod client_session;
    pub mod identification_reply;
    pub mod session_state;
}

pub mod scheduling {
    pub mod retry_scheduler;
    pub mod tracked_object;
}

pub mod tracking {
    pub mod domain {
        pub mod face_tracker;
    }
    pub mod infrastructure;
}

pub mod capture {
    pub mod capture_worker;
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod workers {
    pub mod detect_worker;
    pub mod domain {
        pub mod face_detector;
        pub mod face_identifier;
    }
    pub mod identify_worker;
}

pub mod coordinator {
    pub mod coordinator;
}

pub mod pipeline {
    pub mod client_pipeline;
    pub mod frame_report;
    pub mod session_logger;
}
