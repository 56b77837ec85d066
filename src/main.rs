fn main() {
    snapshare_lib::run()
}
