fn main() {
    ci_dispatch::app::cli::run();
}
