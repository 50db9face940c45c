fn main() {
    let process = tonic_build::manual::Method::builder()
        .name("process")
        .route_name("Process")
        .input_type("crate::proto::PipelineMessage")
        .output_type("crate::proto::PipelineMessage")
        .codec_path("tonic::codec::ProstCodec")
        .build();

    let service = tonic_build::manual::Service::builder()
        .name("PipelineService")
        .package("story_pipeline")
        .method(process)
        .build();

    tonic_build::manual::Builder::new().compile(&[service]);
}
