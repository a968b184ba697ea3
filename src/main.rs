fn main() {
    report_chat_lib::run()
}
